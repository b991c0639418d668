/// OpenAI / Azure OpenAI chat completion integration, used to stream explanations.
pub mod openai;

/// openchain signature database integration, used to resolve function selectors.
pub mod openchain;

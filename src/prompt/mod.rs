pub mod constructor;

pub use constructor::{
    compose_generation_request, GenerationRequest, PromptConstructor, FALLBACK_DESCRIPTION,
};

pub mod context;
pub mod conversation;
pub mod llm_client;
pub mod prompt;
pub mod reconcile;
pub mod screen_cache;
pub mod upstream;

#[cfg(test)]
pub mod fakes;

pub use context::{assemble, ChatRequest, ContextAssembler, ContextPayload};
pub use conversation::{parse_input, Conversation, Input};
pub use llm_client::{ChatMessage, LlmClient, OpenAiClient, Role};
pub use prompt::PromptConfig;
pub use reconcile::{reconcile, reconcile_urls};
pub use screen_cache::{
    CacheStats, Descriptor, DescriptorKind, ScreenCache, SharedScreenCache, WarmReport,
};
pub use upstream::{ChartSource, JsonFetcher, ScreenSource, UpstreamClient};

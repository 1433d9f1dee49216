pub mod chat;
pub mod compare;
pub mod serve;

use crate::models::AppConfig;
use crate::services::{
    ContextAssembler, LlmClient, OpenAiClient, PromptConfig, ScreenCache, UpstreamClient,
};
use std::sync::Arc;

/// Services shared by the serve and chat commands
pub struct Runtime {
    pub upstream: Arc<UpstreamClient>,
    pub assembler: Arc<ContextAssembler>,
    pub llm: Arc<dyn LlmClient>,
    pub prompt: PromptConfig,
}

/// Wire the upstream client, screen cache, model client and prompt from config
pub fn build_runtime(config: &AppConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    let upstream = Arc::new(UpstreamClient::from_config(config)?);
    let cache = Arc::new(ScreenCache::new(upstream.clone(), config.cache_ttl));
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.llm.clone())?);
    let prompt = PromptConfig::load(config.system_prompt_file.as_deref())?;

    let assembler = Arc::new(ContextAssembler::new(
        cache,
        upstream.clone(),
        llm.clone(),
        prompt.clone(),
        config.chart_code.clone(),
    ));

    Ok(Runtime {
        upstream,
        assembler,
        llm,
        prompt,
    })
}

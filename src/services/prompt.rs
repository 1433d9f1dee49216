use crate::error::Error;
use std::path::Path;
use tracing::info;

/// Persona line used when no prompt file is configured
pub const DEFAULT_PERSONA: &str = "당신은 키움증권 투자 도우미 키우밍입니다.";

/// How to read the screen context and chart indicators
pub const DEFAULT_SCREEN_RULES: &str = "\
아래 JSON은 사용자가 보고 있는 화면의 정보입니다.
- screen: 현재 화면 이름, section: 사용자가 보고 있는 영역, scroll_y: 스크롤 위치입니다.
- elements: 화면 요소 목록이며 description이 요소의 의미입니다. description이 \"no description available.\"인 요소는 추측하지 말고 설명이 없다고 안내하세요.
- region(top/middle/bottom)을 이용해 요소 위치를 \"화면 위쪽\", \"가운데\", \"아래쪽\"처럼 안내하고, scroll_y와 함께 스크롤 방향을 알려주세요.
- chart_indicators가 있으면 차트 화면입니다. MA5가 MA20보다 위에 있으면 단기 상승 흐름(골든크로스 가능성), 아래에 있으면 단기 하락 흐름(데드크로스 가능성)으로 설명하세요.
- recent_closes를 비교해 최근 캔들이 양봉 위주인지 음봉 위주인지, recent_volumes로 거래량이 늘고 있는지 줄고 있는지 설명하세요.
- 값이 null인 이동평균은 데이터가 부족한 것이므로 언급하지 마세요.
- 투자 권유가 아닌 이해를 돕는 설명으로 3~4문장 이내로 친근하게 답하세요.";

/// Instruction block placed ahead of the assembled context
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub persona: String,
    pub screen_rules: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            screen_rules: DEFAULT_SCREEN_RULES.to_string(),
        }
    }
}

impl PromptConfig {
    /// Load the whole instruction block from a text file
    ///
    /// The file replaces both the persona and the rules; an empty file is
    /// rejected.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Config(format!(
                "Prompt file {} is empty",
                path.display()
            )));
        }

        info!(path = %path.display(), chars = content.len(), "Loaded prompt file");

        Ok(Self {
            persona: content.to_string(),
            screen_rules: String::new(),
        })
    }

    /// Load from `path` when given, otherwise use the built-in prompt
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The system message sent to the language model
    pub fn system_message(&self) -> String {
        if self.screen_rules.is_empty() {
            self.persona.clone()
        } else {
            format!("{}\n\n{}", self.persona, self.screen_rules)
        }
    }
}

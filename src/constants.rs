//! Screen and Indicator Constants
//!
//! Fixed values shared by the cache, the reconciliation engine and the chart
//! indicator computation.

/// Description attached to a parser element when no backend label matches it
pub const NO_DESCRIPTION: &str = "no description available.";

/// Screen name that receives chart indicators in the assembled context
pub const CHART_SCREEN: &str = "chart";

/// Screens warmed into the cache at startup
pub const WARM_SCREENS: &[&str] = &["home", "chart", "order", "portfolio"];

/// Moving average windows reported to the language model
///
/// | Field | Window |
/// |-------|--------|
/// | MA5   | 5      |
/// | MA10  | 10     |
/// | MA20  | 20     |
/// | MA60  | 60     |
/// | MA120 | 120    |
pub const MA_WINDOWS: [usize; 5] = [5, 10, 20, 60, 120];

/// Number of trailing candles kept in the recent_* summaries
pub const RECENT_WINDOW: usize = 5;

/// Instrument the live chart path requests (Samsung Electronics)
pub const DEFAULT_CHART_CODE: &str = "005930";

/// Key of the candle array in the chart service response
pub const CANDLE_ARRAY_KEY: &str = "stk_dt_pole_chart_qry";

/// Timezone used to derive the chart `base_dt` query parameter
pub const MARKET_TIMEZONE: &str = "Asia/Seoul";

/// Default upstream per-call timeout
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Default language model per-call timeout
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Default HTTP port (matches the compare client scripts)
pub const DEFAULT_PORT: u16 = 6002;

/// Prefix of the reply returned when the chat path fails
pub const ERROR_REPLY_PREFIX: &str = "⚠️ 오류 발생";

/// Inputs that end an interactive chat session
pub const QUIT_COMMANDS: &[&str] = &["quit", "exit", "종료", "q"];

/// Inputs that clear the interactive chat history
pub const RESET_COMMANDS: &[&str] = &["clear", "초기화", "reset"];

/// Completed turns after which the terminal suggests clearing the history
pub const LONG_CONVERSATION_TURNS: usize = 10;

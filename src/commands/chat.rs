use crate::commands::build_runtime;
use crate::models::AppConfig;
use crate::services::{parse_input, ChatRequest, Conversation, Input, LlmClient};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const GREETING: &str =
    "안녕하세요! 저는 키우밍이에요 🌱 함께 투자 실력을 키워볼까요? 궁금한 게 있으시면 편하게 물어보세요!";
const FAREWELL: &str = "오늘도 좋은 투자 되세요! 다음에 또 만나요 👋";

/// Ask one question with screen context, as the /chat endpoint would
pub async fn run(
    text: String,
    context: Option<String>,
    section: Option<String>,
    scroll_y: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let runtime = build_runtime(&config)?;

    let request = ChatRequest {
        text,
        context,
        section,
        scroll_y,
    };

    println!("💬 Asking about screen {:?}...", request.context.as_deref().unwrap_or("-"));
    let reply = runtime.assembler.answer(&request).await;
    println!("\n{}", reply);

    Ok(())
}

/// Multi-turn conversation on stdin with the persona prompt
pub async fn run_interactive() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let runtime = build_runtime(&config)?;

    println!("{}", "=".repeat(80));
    println!("🌱 키우밍과 대화를 시작합니다! (model: {})", config.llm.model);
    println!("{}", "=".repeat(80));
    println!("  • 'quit', 'exit', '종료'를 입력하면 대화가 종료됩니다");
    println!("  • 'clear', '초기화'를 입력하면 대화 기록이 초기화됩니다");
    println!("{}", "-".repeat(80));
    println!("\n🌱 키우밍: {}\n", GREETING);

    let mut conversation = Conversation::new(runtime.prompt.persona.clone());
    converse(&mut conversation, runtime.llm.as_ref()).await
}

async fn converse(
    conversation: &mut Conversation,
    llm: &dyn LlmClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("💬 나: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!("\n\n🌱 키우밍: {}", FAREWELL);
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => {
                println!("\n🌱 키우밍: {}", FAREWELL);
                break;
            }
            Input::Reset => {
                conversation.reset();
                println!("\n[INFO] 대화 기록이 초기화되었습니다.\n");
            }
            Input::Message(text) => match conversation.ask(llm, &text).await {
                Ok(reply) => {
                    println!("\n🌱 키우밍: {}\n", reply);
                    if conversation.is_long() {
                        println!("[TIP] 대화가 길어지면 토큰 비용이 증가해요. 'clear'로 초기화할 수 있어요.\n");
                    }
                }
                Err(e) => {
                    eprintln!("\n❌ {}", e);
                    println!("다시 시도해보세요.\n");
                }
            },
        }
    }

    println!("{}", "=".repeat(80));
    Ok(())
}

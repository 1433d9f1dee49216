use clap::{Parser, Subcommand};

use crate::commands;
use crate::server;

#[derive(Parser)]
#[command(name = "kiwooming")]
#[command(about = "Kiwooming screen-context server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Warm the screen cache and start the HTTP server
    Serve {
        /// Listen port (defaults to PORT or 6002)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Reconcile a parser and a backend descriptor fetched from explicit URLs
    Compare {
        #[arg(long)]
        parser_url: String,
        #[arg(long)]
        backend_url: String,
    },
    /// Ask about a screen from the terminal, or hold an interactive conversation
    Chat {
        /// Multi-turn conversation on stdin instead of a single question
        #[arg(short, long, conflicts_with_all = ["context", "section", "scroll_y", "text"])]
        interactive: bool,
        /// Screen path, e.g. /home or chart
        #[arg(short, long)]
        context: Option<String>,
        #[arg(short, long)]
        section: Option<String>,
        #[arg(long)]
        scroll_y: Option<f64>,
        /// Question text
        #[arg(required_unless_present = "interactive")]
        text: Option<String>,
    },
}

pub async fn run() {
    let cli = Cli::parse();
    server::init_tracing();

    let result = match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await,
        Commands::Compare {
            parser_url,
            backend_url,
        } => commands::compare::run(&parser_url, &backend_url).await,
        Commands::Chat {
            interactive: true, ..
        } => commands::chat::run_interactive().await,
        Commands::Chat {
            context,
            section,
            scroll_y,
            text,
            ..
        } => {
            commands::chat::run(text.unwrap_or_default(), context, section, scroll_y).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

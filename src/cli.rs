use clap::{Parser, Subcommand};

/// tokenscan — Discord bot token detection for text and images
#[derive(Parser)]
#[command(name = "tokenscan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (defaults to TOKENSCAN_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scan text for a token and print the verdict as JSON
    Scan {
        /// Text to scan; read from stdin when omitted
        text: Option<String>,
        /// Apply the lenient OCR policy
        #[arg(long)]
        image: bool,
    },

    /// Download an image, OCR it and print the extracted text as JSON
    Ocr {
        url: String,
        /// Also scan the OCR text for a token
        #[arg(long)]
        scan: bool,
    },
}

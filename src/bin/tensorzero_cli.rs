//! tensorzero-cli: inspect gateway configuration and run inferences from a terminal.
//!
//! Usage:
//!   tensorzero-cli functions <config>                         List functions and their variants
//!   tensorzero-cli inference (--function <f> | --model <m>) <text>
//!   tensorzero-cli stream (--function <f> | --model <m>) <text>

use anyhow::{anyhow, bail, Context};
use std::io::Write;
use tensorzero_client::types::{ContentBlockChunk, InferenceChunk, InferenceResponse};
use tensorzero_client::{
    Config, Gateway, HttpGatewayBuilder, InferenceInput, InferenceRequest, Message, Variant,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "functions" => cmd_functions(&args[2..]).await,
        "inference" => cmd_inference(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"tensorzero-cli: TensorZero gateway command-line client

USAGE:
    tensorzero-cli <COMMAND> [OPTIONS]

COMMANDS:
    functions <config>                            List functions and variant types in a config file
    inference (--function <name> | --model <name>) <text>
                                                  Run one inference and print the result
    stream (--function <name> | --model <name>) <text>
                                                  Stream an inference, printing text as it arrives
    version                                       Show version information
    help                                          Show this help message

ENVIRONMENT:
    TENSORZERO_GATEWAY_URL      Gateway base URL (default http://localhost:3000)
    TENSORZERO_TIMEOUT_SECS     Connect and non-streaming timeout in seconds (default 30)
    TENSORZERO_STREAM_BUFFER    Streamed chunk buffer size (default 10)
    RUST_LOG                    Log filter (default info)"#
    );
}

fn cmd_version() {
    println!("tensorzero-cli {}", env!("CARGO_PKG_VERSION"));
}

async fn cmd_functions(args: &[String]) -> anyhow::Result<()> {
    let path = args
        .first()
        .ok_or_else(|| anyhow!("functions: missing <config> path"))?;
    let config = Config::load(path)
        .await
        .with_context(|| format!("loading {path}"))?;

    if config.functions.is_empty() {
        println!("(no functions)");
        return Ok(());
    }
    for (name, function) in &config.functions {
        println!("{name} [{}]", function.variant_type());
        for (variant_name, variant) in function.variants() {
            match variant.model() {
                Some(model) => println!("  {variant_name}: {} ({model})", variant.variant_type()),
                None => println!("  {variant_name}: {}", variant.variant_type()),
            }
        }
    }
    Ok(())
}

/// `--function <f>` or `--model <m>`, followed by the user text.
fn parse_request(args: &[String]) -> anyhow::Result<InferenceRequest> {
    let mut function = None;
    let mut model = None;
    let mut text = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--function" => {
                function = Some(iter.next().ok_or_else(|| anyhow!("--function needs a value"))?)
            }
            "--model" => model = Some(iter.next().ok_or_else(|| anyhow!("--model needs a value"))?),
            other => text.push(other.to_string()),
        }
    }
    if text.is_empty() {
        bail!("missing <text>");
    }

    let input = InferenceInput::new(vec![Message::user(text.join(" "))]);
    let builder = InferenceRequest::builder(input);
    let builder = match (function, model) {
        (Some(f), None) => builder.function_name(f.as_str()),
        (None, Some(m)) => builder.model_name(m.as_str()),
        _ => bail!("exactly one of --function or --model is required"),
    };
    Ok(builder.build())
}

/// Token cancelled on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    cancel
}

async fn cmd_inference(args: &[String]) -> anyhow::Result<()> {
    let request = parse_request(args)?;
    let gateway = HttpGatewayBuilder::from_env().build()?;
    let response = gateway.inference(&request, ctrl_c_token()).await?;

    match &response {
        InferenceResponse::Chat(chat) => {
            for block in &chat.content {
                match (block.as_text(), block.as_tool_call()) {
                    (Some(text), _) => println!("{text}"),
                    (None, Some(call)) => println!("[tool_call {}] {}", call.raw_name, call.raw_arguments),
                    _ => println!("[{}]", block.variant_type()),
                }
            }
        }
        InferenceResponse::Json(json) => {
            println!("{}", json.output.raw.as_deref().unwrap_or("null"));
        }
    }
    eprintln!(
        "inference {} via {} ({} tokens)",
        response.inference_id(),
        response.variant_name(),
        response.usage().total()
    );
    Ok(())
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    let request = parse_request(args)?;
    let gateway = HttpGatewayBuilder::from_env().build()?;
    let mut stream = gateway.inference_stream(&request, ctrl_c_token());

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next_chunk().await {
        match &chunk {
            InferenceChunk::Chat(chat) => {
                for block in &chat.content {
                    if let ContentBlockChunk::Text(t) = block {
                        write!(stdout, "{}", t.text)?;
                    }
                }
            }
            InferenceChunk::Json(json) => write!(stdout, "{}", json.raw)?,
        }
        stdout.flush()?;
    }
    writeln!(stdout)?;

    if let Some(e) = stream.error().await {
        return Err(e.into());
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use prescription_core::ExtractorConfig;
use prescription_text::extract;
use prescription_ui::{render_with, RenderConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "prescription-cli",
    about = "Trích xuất đơn thuốc từ văn bản trả về của dịch vụ phân tích ảnh."
)]
struct Args {
    /// Đường dẫn tới file văn bản thô.
    #[arg(short, long)]
    input: PathBuf,

    /// Định dạng đầu ra.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Ghi ra file thay vì stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tắt các chiến lược dự phòng.
    #[arg(long)]
    no_fallback: bool,

    /// Sửa lỗi chính tả tên thuốc bằng từ điển tích hợp.
    #[arg(long)]
    correct_names: bool,

    /// Nhúng CSS mặc định vào HTML.
    #[arg(long)]
    embed_styles: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
}

impl Args {
    fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            fallback_enabled: !self.no_fallback,
            correct_medication_names: self.correct_names,
            ..ExtractorConfig::default()
        }
    }

    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            embed_styles: self.embed_styles,
            ..RenderConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prescription=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    run(&args).await
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let rendered = format_output(&raw, args).await?;

    match &args.output {
        Some(path) => write_output(path, &rendered)?,
        None => println!("{rendered}"),
    }

    Ok(())
}

async fn format_output(raw: &str, args: &Args) -> anyhow::Result<String> {
    let report = extract(raw, &args.extractor_config());

    match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&report).context("Không serialize được báo cáo")
        }
        OutputFormat::Html => {
            let document = render_with(&report.result, raw, &args.render_config()).await;
            tracing::info!(kind = ?document.kind, "document rendered");
            Ok(document.html)
        }
    }
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).with_context(|| format!("Không ghi được file {path:?}"))
}

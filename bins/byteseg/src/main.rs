//! byteseg - 字节范围 HLS 点播列表生成工具
//!
//! 读取一个 MPEG-TS 文件, 在达到帧数阈值后的第一个关键帧处切分,
//! 把播放列表写到标准输出. 诊断信息全部写到标准错误, 每行以 `SEGLOG:` 开头.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, error, info, warn};

use byteseg_core::Rational;
use byteseg_format::demuxers::mpegts::DEFAULT_PROBE_PACKETS;
use byteseg_format::{FormatRegistry, IoContext};
use byteseg_hls::{DemuxerSource, PacketSource, RangeStyle, RunSummary, SegmenterConfig};

#[derive(Parser, Debug)]
#[command(
    name = "byteseg",
    version,
    about = "为 MPEG-TS 文件生成按关键帧对齐的字节范围 HLS 点播列表"
)]
struct Cli {
    /// 输入 MPEG-TS 文件路径 (同时作为播放列表中的 URI)
    input: PathBuf,

    /// 每个切片至少包含的视频帧数
    chunk_frames: u64,

    /// 视频帧率 (如 "25" 或 "30000/1001")
    framerate: Rational,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 同时把日志写入该目录 (按天滚动)
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// 打开文件时最多扫描多少个 TS 包来寻找 PAT/PMT
    #[arg(long = "probe-packets", default_value_t = DEFAULT_PROBE_PACKETS)]
    probe_packets: usize,

    /// 输出标准的相对字节范围 (默认保持旧工具的输出格式)
    #[arg(long = "strict-ranges")]
    strict_ranges: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return report_usage_error(e),
    };

    let _guard = match logging::init(cli.verbose, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} 错误: 无法初始化日志: {e:#}", logging::PREFIX);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(summary) => {
            debug!("{summary:?}");
            if let Some(e) = &summary.read_error {
                warn!("播放列表只覆盖读取失败之前的部分: {e}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// 参数错误: 帮助和版本信息正常输出, 其余错误带前缀写到标准错误
fn report_usage_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            // 写入失败时也无法再报告什么
            let _ = e.print();
            ExitCode::SUCCESS
        }
        _ => {
            for line in e.render().to_string().lines() {
                if !line.trim().is_empty() {
                    eprintln!("{} {line}", logging::PREFIX);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let range_style = if cli.strict_ranges {
        RangeStyle::Strict
    } else {
        RangeStyle::Legacy
    };
    let config = SegmenterConfig::new(cli.chunk_frames, cli.framerate)
        .context("无效的帧率")?
        .with_range_style(range_style);

    let uri = cli.input.to_string_lossy();
    let mut source = open_source(cli)?;
    info!(
        "输入: {uri}, 格式: {}, {} 条流, 每片至少 {} 帧, 帧率 {} ({:.3} fps)",
        source.format_name(),
        source.streams().len(),
        config.chunk_frames,
        config.framerate,
        config.framerate.to_f64(),
    );

    let stdout = std::io::stdout();
    let summary = byteseg_hls::write_playlist(&mut source, &config, &uri, stdout.lock())
        .context("生成播放列表失败")?;
    Ok(summary)
}

/// 打开输入并解析流信息, 每一步失败都给出单独的诊断
fn open_source(cli: &Cli) -> anyhow::Result<DemuxerSource> {
    let mut registry = FormatRegistry::new();
    byteseg_format::register_all(&mut registry);
    let input = cli.input.display();

    let format_id = registry
        .find_demuxer("mpegts")
        .context("找不到 MPEG-TS 解封装器")?;

    let mut io = IoContext::open_read(&cli.input)
        .with_context(|| format!("无法打开输入文件 '{input}'"))?;

    let score = registry
        .probe_input(format_id, &mut io, cli.input.to_str())
        .with_context(|| format!("无法识别输入文件 '{input}', 请确认是 MPEG-TS 文件"))?;
    debug!("{format_id} 格式置信度 {score}");

    let mut demuxer = registry.create_demuxer(format_id)?;
    demuxer.set_probe_packets(cli.probe_packets);
    demuxer
        .open(&mut io)
        .with_context(|| format!("无法读取 '{input}' 的流信息"))?;

    Ok(DemuxerSource::new(demuxer, io))
}

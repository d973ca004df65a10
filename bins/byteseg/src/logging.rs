//! 日志初始化模块.
//!
//! 标准输出只留给播放列表, 所有诊断信息都写到标准错误:
//! - console: stderr, 每行以 `SEGLOG:` 开头, 默认 info, 可通过 -v/-vv 或 BYTESEG_LOG 环境变量调整
//! - file: 可选, 无色, 按天滚动, 输出到 {dir}/byteseg.{date}.log
//!
//! 库 crate 使用 `log` 门面, 由 tracing-subscriber 的 tracing-log 桥接收集.

use chrono::{Datelike, Local, Timelike};
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 诊断信息前缀
pub const PREFIX: &str = "SEGLOG:";

/// 覆盖日志级别的环境变量
const LOG_ENV: &str = "BYTESEG_LOG";

/// 初始化日志系统
///
/// - `verbosity`: 0=info, 1=debug, 2+=trace (由 -v/-vv 控制)
/// - `log_dir`: 额外写入日志文件的目录
///
/// 返回文件日志的后台写入守卫, 调用方需持有到进程退出前.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let make_filter =
        || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .event_format(ConsoleFormatter {
            color: std::io::stderr().is_terminal(),
        })
        .with_filter(make_filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix("byteseg")
                .filename_suffix("log")
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::Layer::default()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(FileFormatter)
                .with_filter(make_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Console 格式: `SEGLOG: LEVEL 消息`, 终端下级别带颜色
struct ConsoleFormatter {
    color: bool,
}

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        if self.color {
            let color = match level {
                tracing::Level::ERROR => "\x1b[31m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::INFO => "\x1b[32m",
                _ => "\x1b[34m",
            };
            write!(writer, "{PREFIX} {color}{level:5}\x1b[0m ")?;
        } else {
            write!(writer, "{PREFIX} {level:5} ")?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色, 无 target, 时间戳 + 级别 + 消息
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        write!(
            writer,
            "[{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}] {:5} > ",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
            event.metadata().level(),
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// `log` sink forwarding every enabled record to a channel.
pub struct ChannelLogger {
    sender: Sender<LogMessage>,
    level: LevelFilter,
}

impl log::Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = self.sender.try_send(LogMessage {
                level: record.metadata().level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {}
}

impl ChannelLogger {
    pub fn new(sender: Sender<LogMessage>, level: LevelFilter) -> Self {
        Self { sender, level }
    }

    pub fn with_receiver(level: LevelFilter) -> (Self, Receiver<LogMessage>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender, level), receiver)
    }

    #[inline]
    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

/// Install a [`ChannelLogger`] as the global logger and hand back its
/// receiving end. Fails if any global logger is already set.
pub fn init_channel_logger(level: LevelFilter) -> Result<Receiver<LogMessage>, SetLoggerError> {
    let (logger, receiver) = ChannelLogger::with_receiver(level);
    log::set_logger(Box::leak(Box::new(logger)))?;
    log::set_max_level(level);
    Ok(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn record<'a>(level: Level, args: std::fmt::Arguments<'a>) -> Record<'a> {
        Record::builder().level(level).target("meme_engine::test").args(args).build()
    }

    #[test]
    fn forwards_records_at_or_above_level() {
        // Given
        let (logger, receiver) = ChannelLogger::with_receiver(LevelFilter::Info);

        // When
        logger.log(&record(Level::Info, format_args!("kept {}", 1)));
        logger.log(&record(Level::Debug, format_args!("dropped")));

        // Then
        let messages: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            messages,
            vec![LogMessage {
                level: Level::Info,
                target: "meme_engine::test".into(),
                message: "kept 1".into(),
            }]
        );
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (logger, receiver) = ChannelLogger::with_receiver(LevelFilter::Trace);
        drop(receiver);

        logger.log(&record(Level::Error, format_args!("nobody listens")));
    }

    #[test]
    fn global_install_happens_once() {
        // Given
        let receiver = init_channel_logger(LevelFilter::Warn).unwrap();

        // When
        log::warn!(target: "meme_engine::install", "installed");
        let second = init_channel_logger(LevelFilter::Trace);

        // Then
        assert!(second.is_err());
        assert!(
            receiver
                .try_iter()
                .any(|message| message.target == "meme_engine::install" && message.message == "installed")
        );
    }
}

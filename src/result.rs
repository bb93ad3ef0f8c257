extern crate anyhow;
extern crate flexi_logger;
extern crate notify;
extern crate reqwest;
extern crate rumqttc;
extern crate serde_json;
extern crate std;

pub type DashResult<T> = std::result::Result<T, DashError>;

#[derive(Debug)]
pub enum DashError {
    HttpError(reqwest::Error),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    MqttError(rumqttc::ClientError),
    WatchError(notify::Error),
    LoggerError(flexi_logger::FlexiLoggerError),
    Other(anyhow::Error),
    Message(String),
}

pub fn make_error(msg: &str) -> DashError {
    return DashError::Message(msg.to_string());
}

impl std::fmt::Display for DashError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            DashError::HttpError(ref err) => {
                return write!(f, "HTTP Error: {}", err);
            },
            DashError::IoError(ref err) => {
                return write!(f, "IO Error: {}", err);
            },
            DashError::JsonError(ref err) => {
                return write!(f, "JSON Error: {}", err);
            },
            DashError::MqttError(ref err) => {
                return write!(f, "MQTT Error: {}", err);
            },
            DashError::WatchError(ref err) => {
                return write!(f, "Watch Error: {}", err);
            },
            DashError::LoggerError(ref err) => {
                return write!(f, "Logger Error: {}", err);
            },
            DashError::Other(ref err) => {
                return write!(f, "{:#}", err);
            },
            DashError::Message(ref msg) => {
                return write!(f, "{}", msg);
            },
        }
    }
}

impl std::error::Error for DashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            DashError::HttpError(ref err) => Some(err),
            DashError::IoError(ref err) => Some(err),
            DashError::JsonError(ref err) => Some(err),
            DashError::MqttError(ref err) => Some(err),
            DashError::WatchError(ref err) => Some(err),
            DashError::LoggerError(ref err) => Some(err),
            DashError::Other(ref err) => Some(&**err),
            DashError::Message(_) => None,
        }
    }
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> DashError {
        return DashError::HttpError(err);
    }
}

impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> DashError {
        return DashError::IoError(err);
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> DashError {
        return DashError::JsonError(err);
    }
}

impl From<rumqttc::ClientError> for DashError {
    fn from(err: rumqttc::ClientError) -> DashError {
        return DashError::MqttError(err);
    }
}

impl From<notify::Error> for DashError {
    fn from(err: notify::Error) -> DashError {
        return DashError::WatchError(err);
    }
}

impl From<flexi_logger::FlexiLoggerError> for DashError {
    fn from(err: flexi_logger::FlexiLoggerError) -> DashError {
        return DashError::LoggerError(err);
    }
}

impl From<anyhow::Error> for DashError {
    fn from(err: anyhow::Error) -> DashError {
        return DashError::Other(err);
    }
}

#[cfg(test)]
mod tests {
    use super::make_error;
    use super::DashError;

    #[test]
    fn message_display() {
        assert_eq!("no pages configured", make_error("no pages configured").to_string());
    }

    #[test]
    fn anyhow_context_is_kept() {
        use anyhow::Context;

        let res: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err: DashError = res.context("while reading config").unwrap_err().into();

        let msg = err.to_string();
        assert!(msg.contains("while reading config"), "{}", msg);
        assert!(msg.contains("gone"), "{}", msg);
    }
}

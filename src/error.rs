use crate::executor::task::TaskError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("executor error: {0}")]
    Executor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("shutdown wait interrupted")]
    Interrupted,

    #[error("work item was not accepted")]
    Rejected,

    #[error("work item was abandoned before it ran")]
    Abandoned,

    #[error("result already taken")]
    ResultTaken,

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl From<TaskError> for Error {
    fn from(err: TaskError) -> Self {
        Error::TaskFailed(err.to_string())
    }
}

/// A lexed token: a word with quoting and expansion already resolved, or one
/// of the shell's operators. Word tokens never carry quote characters.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    And,
    Or,
    RedirIn,
    RedirOut,
    RedirAppend,
}

/// The operator that follows a sequence item and gates the next one.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Connector {
    None,
    And,
    Or,
}

/// One command of a pipeline: argv plus redirection specs.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Stage {
    pub argv: Vec<String>,
    pub stdin_file: Option<String>,
    pub stdout_file: Option<String>,
    pub append: bool,
}

impl Stage {
    pub fn has_redirs(&self) -> bool {
        self.stdin_file.is_some() || self.stdout_file.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty() && !self.has_redirs()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

/// A pipeline paired with the connector that decides whether the next item
/// in the same input line runs.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SeqItem {
    pub pipeline: Pipeline,
    pub connector: Connector,
}

use thiserror::Error;

use crate::types::{Connector, Pipeline, SeqItem, Stage, Token};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error: empty command before `{0}`")]
    EmptyBeforeOperator(&'static str),
    #[error("syntax error: empty command in pipeline")]
    EmptyStage,
    #[error("syntax error: `{0}` requires a file")]
    RedirWithoutTarget(&'static str),
    #[error("syntax error: empty pipeline")]
    EmptyPipeline,
}

type ParseResult<T> = Result<T, ParseError>;

/// Split a token stream into pipelines joined by `&&` / `||`.
///
/// The connector recorded on each item is the operator that *follows* it and
/// gates the next one. An empty token stream yields an empty sequence; a
/// trailing operator with nothing after it leaves no trailing item.
pub fn parse_sequence(tokens: &[Token]) -> ParseResult<Vec<SeqItem>> {
    let mut items: Vec<SeqItem> = vec![];
    let mut unit: Vec<Token> = vec![];

    for token in tokens {
        let connector = match token {
            Token::And => Connector::And,
            Token::Or => Connector::Or,
            _ => {
                unit.push(token.clone());
                continue;
            }
        };
        if unit.is_empty() {
            let op = if connector == Connector::And { "&&" } else { "||" };
            return Err(ParseError::EmptyBeforeOperator(op));
        }
        items.push(SeqItem {
            pipeline: parse_pipeline(&unit)?,
            connector,
        });
        unit.clear();
    }
    if !unit.is_empty() {
        items.push(SeqItem {
            pipeline: parse_pipeline(&unit)?,
            connector: Connector::None,
        });
    }
    Ok(items)
}

/// Parse the tokens of one pipeline unit into `|`-separated stages.
fn parse_pipeline(tokens: &[Token]) -> ParseResult<Pipeline> {
    let mut stages: Vec<Stage> = vec![];
    let mut cur = Stage::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Word(w) => cur.argv.push(w.clone()),
            Token::Pipe => {
                if cur.argv.is_empty() {
                    return Err(ParseError::EmptyStage);
                }
                stages.push(std::mem::take(&mut cur));
            }
            Token::RedirIn => {
                cur.stdin_file = Some(redir_target(iter.next(), "<")?);
            }
            Token::RedirOut => {
                cur.stdout_file = Some(redir_target(iter.next(), ">")?);
                cur.append = false;
            }
            Token::RedirAppend => {
                cur.stdout_file = Some(redir_target(iter.next(), ">>")?);
                cur.append = true;
            }
            // Sequencer consumed these already.
            Token::And | Token::Or => unreachable!("connector inside pipeline unit"),
        }
    }

    if !cur.argv.is_empty() {
        stages.push(cur);
    } else if cur.has_redirs() {
        // A redirection with no command: "> f" alone is an empty pipeline,
        // "a | > f" an empty stage.
        return Err(if stages.is_empty() {
            ParseError::EmptyPipeline
        } else {
            ParseError::EmptyStage
        });
    }
    if stages.is_empty() {
        return Err(ParseError::EmptyPipeline);
    }
    Ok(Pipeline { stages })
}

fn redir_target(token: Option<&Token>, op: &'static str) -> ParseResult<String> {
    match token {
        Some(Token::Word(w)) => Ok(w.clone()),
        _ => Err(ParseError::RedirWithoutTarget(op)),
    }
}

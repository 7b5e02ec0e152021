//! Slash directives typed by the user and how they map onto tool calls.
//!
//! The conversational layer owns the model; this module only fixes the
//! contract: which directives exist, which tool each one triggers and which
//! reasoning step follows.

use serde_json::json;

use super::{ToolCall, ToolName};

/// Instructions for the conversational model, listing every directive
pub const SYSTEM_PROMPT: &str = "\
You are a research librarian tracking scientific papers.

You have several tasks you can complete:
- /chat: [default] chat with the user, answering questions about research you've read.
- /searchArxiv: query for new papers on a topic with the search_scholarly function.
- /searchWikipedia: query for new articles with the search_encyclopedia function.
- /searchResults: summarize the results and print the Date, Title, Category, Link and Summary of each in markdown format.
- /download: download a document from a url with the download_document function.
- /read: extract the text of a downloaded document with the extract_text function, then write structured notes on it starting with the title, summary, key details, learnings, recommendations and potential applications.
- /summarize: summarize a paper into a short paragraph covering its effects and significance.
- /notate: generate detailed structured notes on a paper.
- /report: given research data, write a report on the function, effects and significance of all the research combined.
- /help: print this message.
- /terminate: terminate the conversation.

Once a command is complete, append TERMINATE to the end of the message.
The user can not execute code directly. They must use the functions provided.";

/// Reasoning step the conversational model performs after (or instead of) a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningTask {
    /// Structured notes on freshly read text
    StructuredNotes,
    Summarize,
    Notate,
    Report,
}

impl ReasoningTask {
    /// Instruction handed to the model for this step
    pub fn instructions(&self) -> &'static str {
        match self {
            ReasoningTask::StructuredNotes => {
                "Create structured notes on the document, starting with the title, then a \
                 summary, key details, learnings, recommendations and potential applications."
            }
            ReasoningTask::Summarize => {
                "Summarize the paper into a short paragraph covering its effects and significance."
            }
            ReasoningTask::Notate => "Generate detailed structured notes on the paper.",
            ReasoningTask::Report => {
                "Write a report on the research provided, detailing the function, effects and \
                 significance of all the research combined."
            }
        }
    }
}

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Free text, no directive
    Chat(String),
    SearchArxiv(String),
    SearchWikipedia(String),
    Download { url: String, filename: String },
    Read { filename: String },
    Summarize(String),
    Notate(String),
    Report(String),
    Help,
    Terminate,
}

/// What the conversational layer should do with a directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectivePlan {
    /// Invoke a tool, then optionally run a reasoning step on its result
    Tool(ToolCall, Option<ReasoningTask>),
    /// Reasoning only, no tool involved
    Reasoning(ReasoningTask),
    Help,
    Terminate,
    Chat,
}

/// Error for input that looks like a directive but is not one
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("unknown directive '/{name}'; known directives: {known}")]
    Unknown { name: String, known: String },

    #[error("/{directive} needs {expected}")]
    MissingArgument {
        directive: &'static str,
        expected: &'static str,
    },
}

const KNOWN: [&str; 10] = [
    "chat",
    "searchArxiv",
    "searchWikipedia",
    "download",
    "read",
    "summarize",
    "notate",
    "report",
    "help",
    "terminate",
];

impl Directive {
    /// Parse one line of user input. Directive names are case-insensitive;
    /// a line that does not start with `/` is chat.
    pub fn parse(line: &str) -> Result<Self, DirectiveError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Directive::Chat(line.to_string()));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        let directive = match name.to_ascii_lowercase().as_str() {
            "chat" => Directive::Chat(argument.to_string()),
            "searcharxiv" => Directive::SearchArxiv(require(argument, "searchArxiv", "a query")?),
            "searchwikipedia" => {
                Directive::SearchWikipedia(require(argument, "searchWikipedia", "a query")?)
            }
            "download" => {
                let (url, filename) = argument
                    .split_once(char::is_whitespace)
                    .map(|(url, filename)| (url.trim(), filename.trim()))
                    .filter(|(url, filename)| !url.is_empty() && !filename.is_empty())
                    .ok_or(DirectiveError::MissingArgument {
                        directive: "download",
                        expected: "a URL followed by a filename",
                    })?;
                Directive::Download {
                    url: url.to_string(),
                    filename: filename.to_string(),
                }
            }
            "read" => Directive::Read {
                filename: require(argument, "read", "a filename")?,
            },
            "summarize" => Directive::Summarize(argument.to_string()),
            "notate" => Directive::Notate(argument.to_string()),
            "report" => Directive::Report(argument.to_string()),
            "help" => Directive::Help,
            "terminate" => Directive::Terminate,
            _ => {
                return Err(DirectiveError::Unknown {
                    name: name.to_string(),
                    known: KNOWN
                        .iter()
                        .map(|k| format!("/{}", k))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };

        Ok(directive)
    }

    /// Map the directive onto a tool call and/or reasoning step
    pub fn plan(&self) -> DirectivePlan {
        match self {
            Directive::Chat(_) => DirectivePlan::Chat,
            Directive::SearchArxiv(query) => DirectivePlan::Tool(
                ToolCall::new(ToolName::SearchScholarly.as_str(), json!({ "query": query })),
                None,
            ),
            Directive::SearchWikipedia(query) => DirectivePlan::Tool(
                ToolCall::new(ToolName::SearchEncyclopedia.as_str(), json!({ "query": query })),
                None,
            ),
            Directive::Download { url, filename } => DirectivePlan::Tool(
                ToolCall::new(
                    ToolName::DownloadDocument.as_str(),
                    json!({ "url": url, "filename": filename }),
                ),
                None,
            ),
            Directive::Read { filename } => DirectivePlan::Tool(
                ToolCall::new(ToolName::ExtractText.as_str(), json!({ "filename": filename })),
                Some(ReasoningTask::StructuredNotes),
            ),
            Directive::Summarize(_) => DirectivePlan::Reasoning(ReasoningTask::Summarize),
            Directive::Notate(_) => DirectivePlan::Reasoning(ReasoningTask::Notate),
            Directive::Report(_) => DirectivePlan::Reasoning(ReasoningTask::Report),
            Directive::Help => DirectivePlan::Help,
            Directive::Terminate => DirectivePlan::Terminate,
        }
    }
}

fn require(
    argument: &str,
    directive: &'static str,
    expected: &'static str,
) -> Result<String, DirectiveError> {
    if argument.is_empty() {
        Err(DirectiveError::MissingArgument {
            directive,
            expected,
        })
    } else {
        Ok(argument.to_string())
    }
}

/// Help text listing the directives
pub fn help_text() -> String {
    let mut text = String::from("Available directives:\n");
    for (usage, meaning) in [
        ("/chat <text>", "talk about research already read (default)"),
        ("/searchArxiv <query>", "search arXiv for papers"),
        ("/searchWikipedia <query>", "search Wikipedia for articles"),
        ("/download <url> <filename>", "store a document in the library"),
        ("/read <filename>", "read a stored document and take structured notes"),
        ("/summarize", "summarize a paper in a short paragraph"),
        ("/notate", "detailed structured notes on a paper"),
        ("/report", "combined report over the research so far"),
        ("/help", "show this message"),
        ("/terminate", "end the conversation"),
    ] {
        text.push_str(&format!("  {:<28} {}\n", usage, meaning));
    }
    text
}

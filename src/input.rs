use crate::message::ServerId;

/// A line typed into the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Send {
        data: &'a str,
    },
    Edit {
        id: ServerId,
        body: &'a str,
    },
    Delete {
        id: ServerId,
    },
    List,
    Refresh,
    Quit,
    Usage {
        cmd: &'static str,
        message: &'static str,
    },
    Unknown {
        data: &'a str,
    },
}

impl<'a> Input<'a> {
    pub fn parse(input: &'a str) -> Self {
        let Some(tail) = input.strip_prefix('/') else {
            return Self::Send { data: input };
        };

        let (head, tail) = tail
            .split_once(' ')
            .map(|(head, tail)| (head, tail.trim()))
            .unwrap_or((tail, ""));

        match head {
            "edit" => {
                let parsed = tail
                    .split_once(' ')
                    .and_then(|(id, body)| Some((id.parse().ok()?, body.trim())));

                match parsed {
                    Some((id, body)) if !body.is_empty() => Self::Edit { id, body },
                    _ => Self::Usage {
                        cmd: "/edit",
                        message: "syntax: /edit id new text",
                    },
                }
            }
            "delete" | "del" => match tail.parse() {
                Ok(id) => Self::Delete { id },
                Err(..) => Self::Usage {
                    cmd: "/delete",
                    message: "syntax: /delete id",
                },
            },
            "list" | "ls" => Self::List,
            "refresh" => Self::Refresh,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown { data: input },
        }
    }
}

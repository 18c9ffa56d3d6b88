use crate::Result;
use crate::error::LiquidError;
use crate::runtime::Value;
use crate::tpl::ast::{IfBlock, Node, Object, Tag};
use crate::tpl::expr::parse_object;
use crate::tpl::token::{Token, TokenKind, Tokenizer};
use log::warn;

/// Deepest `if`/`for` nesting a template may use.
pub(crate) const MAX_BLOCK_DEPTH: usize = 128;

/// A block tag whose closing tag has not been seen yet.
///
/// Nodes parsed while a frame is open go into its body (for `if`, into the
/// body of its last block).
enum TagFrame {
    If {
        blocks: Vec<IfBlock>,
        offset: usize,
    },
    For {
        variable: String,
        object: Object,
        body: Vec<Node>,
        offset: usize,
    },
}

/// Hand-written parser for Liquid templates.
///
/// It supports:
/// - Plain text
/// - Object interpolation: `{{ expr }}`, `{{ expr | filter: arg, ... }}`
/// - Tags: `{% assign %}`, `{% if %}`/`{% elsif %}`/`{% else %}`/`{% endif %}`,
///   `{% for x in list %}`/`{% endfor %}`, `{% break %}`, `{% continue %}`
///
/// Block tags are kept on a stack until their closing tag shows up.
struct Parser<'a> {
    template: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    tag_stack: Vec<TagFrame>,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            template,
            pos: 0,
            nodes: Vec::new(),
            tag_stack: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Vec<Node>> {
        while self.pos < self.template.len() {
            self.read_node()?;
        }

        if let Some(frame) = self.tag_stack.last() {
            let (name, offset) = match frame {
                TagFrame::If { offset, .. } => ("if", *offset),
                TagFrame::For { offset, .. } => ("for", *offset),
            };
            return Err(LiquidError::parse(
                format!("Unclosed '{}' tag", name),
                offset,
            ));
        }

        Ok(self.nodes)
    }

    fn read_node(&mut self) -> Result<()> {
        let template: &'a str = self.template;
        let remaining = &template[self.pos..];

        let brace = match remaining.find('{') {
            Some(i) if i + 1 < remaining.len() => i,
            // No brace, or a lone brace as the very last character.
            _ => {
                self.dispatch_node(Node::Text(remaining.to_string()));
                self.pos = self.template.len();
                return Ok(());
            }
        };

        if brace > 0 {
            self.dispatch_node(Node::Text(remaining[..brace].to_string()));
            self.pos += brace;
            return Ok(());
        }

        match remaining.as_bytes()[1] {
            b'{' => self.read_object(),
            b'%' => self.read_tag(),
            _ => {
                self.dispatch_node(Node::Text("{".to_string()));
                self.pos += 1;
                Ok(())
            }
        }
    }

    /// Handle `{{ ... }}`.
    fn read_object(&mut self) -> Result<()> {
        let (tokens, end) = self.read_delimited("}}", "object")?;
        let object = parse_object(&tokens, end)?;
        self.dispatch_node(Node::Object(object));
        self.pos = end + 2;
        Ok(())
    }

    /// Handle `{% ... %}`.
    fn read_tag(&mut self) -> Result<()> {
        let start = self.pos;
        let (tokens, end) = self.read_delimited("%}", "tag")?;
        self.process_tag(&tokens, start, end)?;
        self.pos = end + 2;
        Ok(())
    }

    /// Tokenizes the text between the opening delimiter at `self.pos` and `close`.
    /// Returns the tokens and the offset of `close`.
    fn read_delimited(&self, close: &str, what: &str) -> Result<(Vec<Token<'a>>, usize)> {
        let template: &'a str = self.template;
        let start = self.pos + 2;
        let Some(len) = template[start..].find(close) else {
            return Err(LiquidError::parse(
                format!("Unterminated {}: missing '{}'", what, close),
                self.pos,
            ));
        };
        let end = start + len;
        let tokens = Tokenizer::new(&template[start..end], start).tokenize()?;
        Ok((tokens, end))
    }

    fn process_tag(&mut self, tokens: &[Token<'a>], start: usize, end: usize) -> Result<()> {
        let Some((keyword, rest)) = tokens.split_first() else {
            return Err(LiquidError::parse("Empty tag", start));
        };

        match keyword.text {
            "assign" => self.handle_assign(rest, keyword, end),
            "if" => {
                self.check_depth(start)?;
                let condition = parse_object(rest, end)?;
                self.tag_stack.push(TagFrame::If {
                    blocks: vec![IfBlock {
                        condition,
                        body: Vec::new(),
                    }],
                    offset: start,
                });
                Ok(())
            }
            "elsif" => {
                let condition = parse_object(rest, end)?;
                self.push_if_block(condition, "elsif", start)
            }
            "else" => self.push_if_block(Object::Value(Value::Bool(true)), "else", start),
            "endif" => match self.tag_stack.pop() {
                Some(TagFrame::If { blocks, .. }) => {
                    self.dispatch_node(Node::Tag(Tag::If { blocks }));
                    Ok(())
                }
                other => self.unmatched("endif", other, start),
            },
            "for" => {
                self.check_depth(start)?;
                self.handle_for(rest, keyword, start, end)
            }
            "break" => {
                self.dispatch_node(Node::Tag(Tag::Break));
                Ok(())
            }
            "continue" => {
                self.dispatch_node(Node::Tag(Tag::Continue));
                Ok(())
            }
            "endfor" => match self.tag_stack.pop() {
                Some(TagFrame::For {
                    variable,
                    object,
                    body,
                    ..
                }) => {
                    self.dispatch_node(Node::Tag(Tag::For {
                        variable,
                        object,
                        body,
                    }));
                    Ok(())
                }
                other => self.unmatched("endfor", other, start),
            },
            other => {
                warn!("Skipping unknown tag '{}' at offset {}", other, start);
                Ok(())
            }
        }
    }

    /// Handle `assign name = expr`.
    fn handle_assign(&mut self, tokens: &[Token<'a>], keyword: &Token<'a>, end: usize) -> Result<()> {
        let (name, eq) = match tokens {
            [name, eq, ..] if name.kind == TokenKind::Identifier => (name, eq),
            _ => {
                let offset = tokens.first().map_or(keyword.offset, |t| t.offset);
                return Err(LiquidError::parse("Bad assign: expected a variable name", offset));
            }
        };
        if eq.kind != TokenKind::Operator || !eq.is("=") {
            return Err(LiquidError::parse("Bad assign: expected '='", eq.offset));
        }

        let value = parse_object(&tokens[2..], end)?;
        self.dispatch_node(Node::Tag(Tag::Assign {
            variable: name.text.to_string(),
            value,
        }));
        Ok(())
    }

    /// Handle `for name in expr`.
    fn handle_for(
        &mut self,
        tokens: &[Token<'a>],
        keyword: &Token<'a>,
        start: usize,
        end: usize,
    ) -> Result<()> {
        let name = match tokens.first() {
            Some(name) if name.kind == TokenKind::Identifier => name,
            other => {
                let offset = other.map_or(keyword.offset, |t| t.offset);
                return Err(LiquidError::parse("Bad for: expected a variable name", offset));
            }
        };
        match tokens.get(1) {
            Some(tok) if tok.is("in") => {}
            other => {
                let offset = other.map_or(end, |t| t.offset);
                return Err(LiquidError::parse("Bad for: expected 'in'", offset));
            }
        }

        let object = parse_object(&tokens[2..], end)?;
        self.tag_stack.push(TagFrame::For {
            variable: name.text.to_string(),
            object,
            body: Vec::new(),
            offset: start,
        });
        Ok(())
    }

    fn check_depth(&self, start: usize) -> Result<()> {
        if self.tag_stack.len() >= MAX_BLOCK_DEPTH {
            return Err(LiquidError::parse("Blocks nested too deeply", start));
        }
        Ok(())
    }

    fn push_if_block(&mut self, condition: Object, tag: &str, start: usize) -> Result<()> {
        match self.tag_stack.last_mut() {
            Some(TagFrame::If { blocks, .. }) => {
                blocks.push(IfBlock {
                    condition,
                    body: Vec::new(),
                });
                Ok(())
            }
            _ => Err(LiquidError::parse(format!("Bad {}: no open 'if'", tag), start)),
        }
    }

    fn unmatched(&mut self, tag: &str, popped: Option<TagFrame>, start: usize) -> Result<()> {
        if let Some(frame) = popped {
            self.tag_stack.push(frame);
        }
        Err(LiquidError::parse(format!("Bad {}: no matching open tag", tag), start))
    }

    /// Appends a finished node to the innermost open block, or to the top level.
    fn dispatch_node(&mut self, node: Node) {
        match self.tag_stack.last_mut() {
            None => self.nodes.push(node),
            Some(TagFrame::For { body, .. }) => body.push(node),
            Some(TagFrame::If { blocks, .. }) => {
                if let Some(block) = blocks.last_mut() {
                    block.body.push(node);
                }
            }
        }
    }
}

/// Parses a template string into its top-level nodes.
pub fn parse_template(template: &str) -> Result<Vec<Node>> {
    Parser::new(template).parse()
}

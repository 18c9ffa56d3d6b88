use crate::runtime::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Less,
    Leq,
    Greater,
    Geq,
    Equal,
    Inequal,
    And,
    Or,
}

impl BinaryOp {
    /// Maps an operator token to its operation and precedence.
    /// A higher number binds more loosely.
    pub fn from_token(text: &str) -> Option<(BinaryOp, u8)> {
        let info = match text {
            "or" => (BinaryOp::Or, 4),
            "and" => (BinaryOp::And, 3),
            "!=" | "<>" => (BinaryOp::Inequal, 2),
            "==" => (BinaryOp::Equal, 2),
            "<" => (BinaryOp::Less, 1),
            "<=" => (BinaryOp::Leq, 1),
            ">" => (BinaryOp::Greater, 1),
            ">=" => (BinaryOp::Geq, 1),
            _ => return None,
        };
        Some(info)
    }
}

/// Expression nodes: everything that evaluates to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Value(Value),
    Variable(String),
    MemberAccess {
        object: Box<Object>,
        name: String,
    },
    ArrayAccess {
        object: Box<Object>,
        index: Box<Object>,
    },
    BinOp {
        op: BinaryOp,
        lhs: Box<Object>,
        rhs: Box<Object>,
    },
    Pipe {
        object: Box<Object>,
        filter: String,
        arguments: Vec<Value>,
    },
}

impl Object {
    /// Number of levels in the tree; a leaf is 1. Walks without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&Object, usize)> = vec![(self, 1)];
        while let Some((object, level)) = pending.pop() {
            deepest = deepest.max(level);
            match object {
                Object::Value(_) | Object::Variable(_) => {}
                Object::MemberAccess { object, .. } | Object::Pipe { object, .. } => {
                    pending.push((object.as_ref(), level + 1));
                }
                Object::ArrayAccess { object, index } => {
                    pending.push((object.as_ref(), level + 1));
                    pending.push((index.as_ref(), level + 1));
                }
                Object::BinOp { lhs, rhs, .. } => {
                    pending.push((lhs.as_ref(), level + 1));
                    pending.push((rhs.as_ref(), level + 1));
                }
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub condition: Object,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Assign {
        variable: String,
        value: Object,
    },
    For {
        variable: String,
        object: Object,
        body: Vec<Node>,
    },
    Break,
    Continue,
    /// Blocks are tried in order; `else` is a block whose condition is `true`.
    If { blocks: Vec<IfBlock> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Object(Object),
    Tag(Tag),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        let leaf = Object::Variable("a".to_string());
        assert_eq!(leaf.depth(), 1);

        let tree = Object::BinOp {
            op: BinaryOp::And,
            lhs: Box::new(leaf.clone()),
            rhs: Box::new(Object::MemberAccess {
                object: Box::new(Object::ArrayAccess {
                    object: Box::new(leaf.clone()),
                    index: Box::new(Object::Value(Value::Int(0))),
                }),
                name: "b".to_string(),
            }),
        };
        assert_eq!(tree.depth(), 4);
    }
}

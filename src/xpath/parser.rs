//! XPath parser
//!
//! Recursive descent parser producing an expression AST. Rejects anything
//! outside the supported grammar with a descriptive message, including
//! variable references (no binding surface exists) and unknown axes.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Current context (.)
    Context,
    /// Parent (..)
    Parent,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            _ => None,
        }
    }
}

/// Node test in a location step
#[derive(Debug, Clone)]
pub enum NodeTest {
    /// Matches any node of the axis's principal kind (*)
    Any,
    /// Matches nodes with this exact name
    Name(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser { lexer, current, peeked: None }
    }

    /// Parse a complete XPath expression
    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expr()?;
        if !matches!(self.current, Token::Eof) {
            return Err(format!("unexpected token after expression: {:?}", self.current));
        }
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = if let Some(t) = self.peeked.take() { t } else { self.lexer.next_token() };
    }

    fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.as_ref().unwrap_or(&Token::Eof)
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), String> {
        if self.current == token {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected {what}, got {:?}", self.current))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.current, Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;
        while matches!(self.current, Token::And) {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match &self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match &self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match &self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match &self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let mut expr = match &self.current {
            Token::Slash => {
                self.advance();
                if matches!(
                    self.current,
                    Token::Eof
                        | Token::RightBracket
                        | Token::RightParen
                        | Token::Pipe
                        | Token::Comma
                ) {
                    // Bare '/' selects the document root
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                // //step is short for /descendant-or-self::node()/step
                let desc_step = Step {
                    axis: Axis::DescendantOrSelf,
                    node_test: NodeTest::Node,
                    predicates: Vec::new(),
                };
                let step = self.parse_step()?;
                Expr::Path(
                    Box::new(Expr::Path(Box::new(Expr::Root), Box::new(desc_step))),
                    Box::new(step),
                )
            }
            _ => return self.parse_filter_expr(),
        };

        // Path continuation: /step, //step, trailing predicates
        loop {
            match &self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let desc_step = Step {
                        axis: Axis::DescendantOrSelf,
                        node_test: NodeTest::Node,
                        predicates: Vec::new(),
                    };
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(Box::new(expr), Box::new(desc_step))),
                        Box::new(step),
                    );
                }
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    self.expect(Token::RightBracket, "']'")?;
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match &self.current {
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    self.expect(Token::RightBracket, "']'")?;
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let desc_step = Step {
                        axis: Axis::DescendantOrSelf,
                        node_test: NodeTest::Node,
                        predicates: Vec::new(),
                    };
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(Box::new(expr), Box::new(desc_step))),
                        Box::new(step),
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            Token::Dollar => Err("variable references are not supported".to_string()),
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, "')'")?;
                Ok(expr)
            }
            Token::Name(name) => {
                let name = name.clone();
                if matches!(self.peek(), Token::LeftParen) {
                    self.advance();
                    self.advance(); // '('
                    let args = self.parse_function_args()?;
                    Ok(Expr::Function(name, args))
                } else {
                    let step = self.parse_step()?;
                    Ok(Expr::Step(Box::new(step)))
                }
            }
            Token::NodeType(_) | Token::Star | Token::At | Token::Axis(_) => {
                let step = self.parse_step()?;
                Ok(Expr::Step(Box::new(step)))
            }
            Token::Dot => {
                self.advance();
                Ok(Expr::Context)
            }
            Token::DoubleDot => {
                self.advance();
                Ok(Expr::Parent)
            }
            _ => Err(format!("unexpected token: {:?}", self.current)),
        }
    }

    /// Parse a location step (child axis unless written otherwise)
    fn parse_step(&mut self) -> Result<Step, String> {
        let mut axis = Axis::Child;

        // '..' and '.' as steps inside a path
        if matches!(self.current, Token::DoubleDot) {
            self.advance();
            return Ok(Step { axis: Axis::Parent, node_test: NodeTest::Node, predicates: vec![] });
        }
        if matches!(self.current, Token::Dot) {
            self.advance();
            return Ok(Step { axis: Axis::Self_, node_test: NodeTest::Node, predicates: vec![] });
        }

        // '@' abbreviates the attribute axis
        if matches!(self.current, Token::At) {
            axis = Axis::Attribute;
            self.advance();
        }

        // Explicit axis specification
        if let Token::Axis(axis_name) = &self.current {
            axis = Axis::from_name(axis_name)
                .ok_or_else(|| format!("unknown axis: {axis_name}"))?;
            self.advance();
            self.expect(Token::DoubleColon, "'::' after axis")?;
        }

        let node_test = match &self.current {
            Token::Star => {
                self.advance();
                NodeTest::Any
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance();
                NodeTest::Name(name)
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.expect(Token::LeftParen, "'('")?;
                let arg = if let Token::String(s) = &self.current {
                    let s = s.clone();
                    self.advance();
                    Some(s)
                } else {
                    None
                };
                self.expect(Token::RightParen, "')'")?;

                match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "processing-instruction" => NodeTest::ProcessingInstruction(arg),
                    other => return Err(format!("unknown node type: {other}")),
                }
            }
            other => return Err(format!("expected node test, got {other:?}")),
        };

        let mut predicates = Vec::new();
        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket, "']'")?;
        }

        Ok(Step { axis, node_test, predicates })
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();

        if !matches!(self.current, Token::RightParen) {
            args.push(self.parse_expr()?);
            while matches!(self.current, Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }

        self.expect(Token::RightParen, "')'")?;
        Ok(args)
    }
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_predicate() {
        let expr = parse("item[@id='test']").unwrap();
        assert!(matches!(expr, Expr::Step(_)));
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_parent_axis() {
        let expr = parse("parent::node()").unwrap();
        let Expr::Step(step) = expr else { panic!("expected step") };
        assert_eq!(step.axis, Axis::Parent);
    }

    #[test]
    fn test_bare_double_slash_rejected() {
        assert!(parse("//").is_err());
    }

    #[test]
    fn test_variables_rejected() {
        assert!(parse("$var").is_err());
        assert!(parse("//a[$i]").is_err());
    }

    #[test]
    fn test_unknown_axis_rejected() {
        assert!(parse("namespace::x").is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("//a ]").is_err());
    }

    #[test]
    fn test_unbalanced_bracket_rejected() {
        assert!(parse("//a[@b='c'").is_err());
    }
}

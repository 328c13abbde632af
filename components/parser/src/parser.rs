//! Recursive descent parser for the script language

use crate::ast::*;
use crate::error::*;
use crate::lexer::{Keyword, Lexer, Punctuator, SpannedToken, TemplatePart, Token};
use core_types::{JsError, SourcePosition};
use std::rc::Rc;

static END_OF_INPUT: Token = Token::EOF;

/// Deepest statement or expression nesting accepted before parsing fails.
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Script parser
///
/// The whole source is tokenized up front so the parser can look ahead
/// freely, which is how arrow functions are told apart from parenthesized
/// expressions.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<SpannedToken>,
    current: usize,
    /// Track function depth for return validation
    function_depth: usize,
    /// Track loop depth for break/continue validation
    loop_depth: usize,
    /// Current statement/expression recursion depth
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            current: 0,
            function_depth: 0,
            loop_depth: 0,
            nesting: 0,
        }
    }

    /// Parse the source into a [`Program`]
    ///
    /// # Examples
    ///
    /// ```
    /// use parser::Parser;
    ///
    /// let program = Parser::new("let x = 42;").parse().unwrap();
    /// assert_eq!(program.body.len(), 1);
    /// ```
    pub fn parse(&mut self) -> Result<Program, JsError> {
        self.tokens = Lexer::new(self.source).tokenize()?;
        self.current = 0;
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    /// Parse the source as a single expression (used for template substitutions)
    pub fn parse_standalone_expression(&mut self) -> Result<Expression, JsError> {
        self.tokens = Lexer::new(self.source).tokenize()?;
        self.current = 0;
        let expression = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expression)
    }

    // ----- nesting limit -----

    fn too_deep(&self) -> JsError {
        syntax_error("Maximum nesting depth exceeded", Some(self.position()))
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// Each operator in a left-associative chain deepens the tree by one.
    fn check_chain(&self, chain: usize) -> Result<(), JsError> {
        if self.nesting + chain >= MAX_NESTING_DEPTH {
            Err(self.too_deep())
        } else {
            Ok(())
        }
    }

    // ----- token helpers -----

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, distance: usize) -> &Token {
        let index = (self.current + distance).min(self.tokens.len().saturating_sub(1));
        self.tokens.get(index).map(|t| &t.token).unwrap_or(&END_OF_INPUT)
    }

    fn position(&self) -> SourcePosition {
        self.tokens
            .get(self.current)
            .map(|t| t.position.clone())
            .unwrap_or_default()
    }

    fn newline_before(&self) -> bool {
        self.tokens
            .get(self.current)
            .map(|t| t.newline_before)
            .unwrap_or(false)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn check_punctuator(&self, p: Punctuator) -> bool {
        matches!(self.peek(), Token::Punctuator(x) if *x == p)
    }

    fn check_keyword(&self, k: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(x) if *x == k)
    }

    fn check_identifier(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Identifier(x) if x == name)
    }

    fn match_punctuator(&mut self, p: Punctuator) -> bool {
        if self.check_punctuator(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, k: Keyword) -> bool {
        if self.check_keyword(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> JsError {
        match self.peek() {
            Token::EOF => unexpected_eof(Some(self.position())),
            token => unexpected_token(expected, &token.describe(), Some(self.position())),
        }
    }

    fn expect_punctuator(&mut self, p: Punctuator) -> Result<(), JsError> {
        if self.match_punctuator(p) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", p)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, JsError> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Property names after `.` and in object literals may be reserved words.
    fn expect_property_name(&mut self) -> Result<String, JsError> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            Token::Keyword(k) => {
                self.advance();
                Ok(k.as_str().to_string())
            }
            _ => Err(self.unexpected("property name")),
        }
    }

    /// Automatic semicolon insertion: a semicolon may be omitted before `}`,
    /// at the end of input or at a line break.
    fn consume_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_punctuator(Punctuator::Semicolon)
            || self.check_punctuator(Punctuator::RBrace)
            || self.is_at_end()
            || self.newline_before()
        {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    // ----- statements -----

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        self.nested(Self::parse_statement_at_depth)
    }

    fn parse_statement_at_depth(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        match self.peek().clone() {
            Token::Punctuator(Punctuator::LBrace) => {
                let body = self.parse_block_body()?;
                Ok(Statement::BlockStatement { body, position })
            }
            Token::Punctuator(Punctuator::Semicolon) => {
                self.advance();
                Ok(Statement::EmptyStatement { position })
            }
            Token::Keyword(Keyword::Var) | Token::Keyword(Keyword::Let) | Token::Keyword(Keyword::Const) => {
                let (kind, declarations) = self.parse_variable_declarations()?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration {
                    kind,
                    declarations,
                    position,
                })
            }
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::While) => self.parse_while_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Break) | Token::Keyword(Keyword::Continue) => {
                let is_break = self.check_keyword(Keyword::Break);
                if self.loop_depth == 0 {
                    return Err(syntax_error(
                        if is_break { "Illegal break statement" } else { "Illegal continue statement" },
                        Some(position),
                    ));
                }
                self.advance();
                self.consume_semicolon()?;
                Ok(if is_break {
                    Statement::BreakStatement { position }
                } else {
                    Statement::ContinueStatement { position }
                })
            }
            Token::Keyword(Keyword::Throw) => {
                self.advance();
                if self.newline_before() {
                    return Err(syntax_error("Illegal newline after throw", Some(self.position())));
                }
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::ThrowStatement { argument, position })
            }
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Identifier(ref name) if name == "do" => self.parse_do_while_statement(),
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::ExpressionStatement {
                    expression,
                    position,
                })
            }
        }
    }

    fn parse_block_body(&mut self) -> Result<Vec<Statement>, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut body = Vec::new();
        while !self.check_punctuator(Punctuator::RBrace) {
            if self.is_at_end() {
                return Err(unexpected_eof(Some(self.position())));
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn parse_variable_kind(&mut self) -> Result<VariableKind, JsError> {
        match self.advance() {
            Token::Keyword(Keyword::Var) => Ok(VariableKind::Var),
            Token::Keyword(Keyword::Let) => Ok(VariableKind::Let),
            Token::Keyword(Keyword::Const) => Ok(VariableKind::Const),
            other => Err(unexpected_token("declaration", &other.describe(), Some(self.position()))),
        }
    }

    fn parse_variable_declarations(
        &mut self,
    ) -> Result<(VariableKind, Vec<VariableDeclarator>), JsError> {
        let kind = self.parse_variable_kind()?;
        let mut declarations = Vec::new();
        loop {
            let name_position = self.position();
            let name = self.expect_identifier()?;
            let init = if self.match_punctuator(Punctuator::Assign) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            if kind == VariableKind::Const && init.is_none() {
                return Err(syntax_error(
                    "Missing initializer in const declaration",
                    Some(name_position),
                ));
            }
            declarations.push(VariableDeclarator { name, init });
            if !self.match_punctuator(Punctuator::Comma) {
                break;
            }
        }
        Ok((kind, declarations))
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        let name = self.expect_identifier()?;
        let function = self.parse_function_rest(Some(name), position.clone())?;
        Ok(Statement::FunctionDeclaration {
            function: Rc::new(function),
            position,
        })
    }

    /// Parses `(params) { body }` after the `function` keyword and optional name.
    fn parse_function_rest(
        &mut self,
        name: Option<String>,
        position: SourcePosition,
    ) -> Result<FunctionNode, JsError> {
        let params = self.parse_parameters()?;
        let body = self.parse_function_body()?;
        Ok(FunctionNode {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            position,
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut params = Vec::new();
        while !self.check_punctuator(Punctuator::RParen) {
            let rest = self.match_rest_marker();
            let name = self.expect_identifier()?;
            let default = if !rest && self.match_punctuator(Punctuator::Assign) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            params.push(Parameter { name, default, rest });
            if rest || !self.match_punctuator(Punctuator::Comma) {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RParen)?;
        Ok(params)
    }

    /// `...` arrives as three dots from the lexer.
    fn match_rest_marker(&mut self) -> bool {
        let dots = (0..3).all(|i| matches!(self.peek_at(i), Token::Punctuator(Punctuator::Dot)));
        if dots {
            self.current += 3;
        }
        dots
    }

    fn parse_function_body(&mut self) -> Result<Vec<Statement>, JsError> {
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block_body();
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;
        body
    }

    fn parse_return_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        if self.function_depth == 0 {
            return Err(syntax_error("Illegal return statement", Some(position)));
        }
        self.advance();
        let argument = if self.check_punctuator(Punctuator::Semicolon)
            || self.check_punctuator(Punctuator::RBrace)
            || self.is_at_end()
            || self.newline_before()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::ReturnStatement { argument, position })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::IfStatement {
            test,
            consequent,
            alternate,
            position,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>, JsError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    fn parse_while_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::WhileStatement {
            test,
            body,
            position,
        })
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        let body = self.parse_loop_body()?;
        if !self.match_keyword(Keyword::While) {
            return Err(self.unexpected("'while'"));
        }
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;
        self.match_punctuator(Punctuator::Semicolon);
        Ok(Statement::DoWhileStatement {
            body,
            test,
            position,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        self.expect_punctuator(Punctuator::LParen)?;

        // for ([kind] name of|in expr)
        let declared = matches!(
            self.peek(),
            Token::Keyword(Keyword::Var) | Token::Keyword(Keyword::Let) | Token::Keyword(Keyword::Const)
        );
        let offset = usize::from(declared);
        let is_iteration = matches!(self.peek_at(offset), Token::Identifier(_))
            && (matches!(self.peek_at(offset + 1), Token::Identifier(w) if w == "of")
                || matches!(self.peek_at(offset + 1), Token::Keyword(Keyword::In)));
        if is_iteration {
            let kind = if declared {
                Some(self.parse_variable_kind()?)
            } else {
                None
            };
            let binding = self.expect_identifier()?;
            let is_of = self.check_identifier("of");
            self.advance();
            let subject = if is_of {
                self.parse_assignment_expression()?
            } else {
                self.parse_expression()?
            };
            self.expect_punctuator(Punctuator::RParen)?;
            let body = self.parse_loop_body()?;
            return Ok(if is_of {
                Statement::ForOfStatement {
                    kind,
                    binding,
                    iterable: subject,
                    body,
                    position,
                }
            } else {
                Statement::ForInStatement {
                    kind,
                    binding,
                    object: subject,
                    body,
                    position,
                }
            });
        }

        let init = if self.check_punctuator(Punctuator::Semicolon) {
            None
        } else if declared {
            let (kind, declarations) = self.parse_variable_declarations()?;
            Some(ForInit::VariableDeclaration { kind, declarations })
        } else {
            Some(ForInit::Expression(self.parse_expression()?))
        };
        self.expect_punctuator(Punctuator::Semicolon)?;
        let test = if self.check_punctuator(Punctuator::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punctuator(Punctuator::Semicolon)?;
        let update = if self.check_punctuator(Punctuator::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punctuator(Punctuator::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::ForStatement {
            init,
            test,
            update,
            body,
            position,
        })
    }

    fn parse_try_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.position();
        self.advance();
        let block = self.parse_block_body()?;
        let handler = if self.match_keyword(Keyword::Catch) {
            let param = if self.match_punctuator(Punctuator::LParen) {
                let name = self.expect_identifier()?;
                self.expect_punctuator(Punctuator::RParen)?;
                Some(name)
            } else {
                None
            };
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.match_keyword(Keyword::Finally) {
            Some(self.parse_block_body()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(syntax_error("Missing catch or finally after try", Some(position)));
        }
        Ok(Statement::TryStatement {
            block,
            handler,
            finalizer,
            position,
        })
    }

    // ----- expressions -----

    /// Parse a comma expression
    pub fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let first = self.parse_assignment_expression()?;
        if !self.check_punctuator(Punctuator::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.match_punctuator(Punctuator::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::SequenceExpression {
            expressions,
            position,
        })
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        self.nested(Self::parse_assignment_expression_at_depth)
    }

    fn parse_assignment_expression_at_depth(&mut self) -> Result<Expression, JsError> {
        if self.is_arrow_function_start() {
            return self.parse_arrow_function();
        }
        let position = self.position();
        let left = self.parse_conditional_expression()?;
        let operator = match self.peek() {
            Token::Punctuator(Punctuator::Assign) => AssignmentOperator::Assign,
            Token::Punctuator(Punctuator::PlusEq) => AssignmentOperator::AddAssign,
            Token::Punctuator(Punctuator::MinusEq) => AssignmentOperator::SubAssign,
            Token::Punctuator(Punctuator::StarEq) => AssignmentOperator::MulAssign,
            Token::Punctuator(Punctuator::SlashEq) => AssignmentOperator::DivAssign,
            Token::Punctuator(Punctuator::PercentEq) => AssignmentOperator::ModAssign,
            _ => return Ok(left),
        };
        if !left.is_assignment_target() {
            return Err(syntax_error(
                "Invalid left-hand side in assignment",
                Some(self.position()),
            ));
        }
        self.advance();
        let right = self.parse_assignment_expression()?;
        Ok(Expression::AssignmentExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            position,
        })
    }

    fn is_arrow_function_start(&self) -> bool {
        match self.peek() {
            Token::Identifier(_) => {
                matches!(self.peek_at(1), Token::Punctuator(Punctuator::Arrow))
            }
            Token::Punctuator(Punctuator::LParen) => {
                let mut depth = 0usize;
                let mut index = self.current;
                while let Some(spanned) = self.tokens.get(index) {
                    match spanned.token {
                        Token::Punctuator(Punctuator::LParen) => depth += 1,
                        Token::Punctuator(Punctuator::RParen) => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(
                                    self.tokens.get(index + 1).map(|t| &t.token),
                                    Some(Token::Punctuator(Punctuator::Arrow))
                                );
                            }
                        }
                        Token::EOF => return false,
                        _ => {}
                    }
                    index += 1;
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow_function(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let params = if self.check_punctuator(Punctuator::LParen) {
            self.parse_parameters()?
        } else {
            vec![Parameter {
                name: self.expect_identifier()?,
                default: None,
                rest: false,
            }]
        };
        self.expect_punctuator(Punctuator::Arrow)?;
        let body = if self.check_punctuator(Punctuator::LBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment_expression()?))
        };
        Ok(Expression::FunctionExpression {
            function: Rc::new(FunctionNode {
                name: None,
                params,
                body,
                is_arrow: true,
                position: position.clone(),
            }),
            position,
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let test = self.parse_logical_or_expression()?;
        if !self.match_punctuator(Punctuator::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment_expression()?;
        self.expect_punctuator(Punctuator::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            position,
        })
    }

    fn parse_logical_or_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_logical_and_expression()?;
        let mut chain = 0;
        loop {
            let operator = match self.peek() {
                Token::Punctuator(Punctuator::OrOr) => LogicalOperator::Or,
                Token::Punctuator(Punctuator::NullishCoalesce) => LogicalOperator::NullishCoalescing,
                _ => return Ok(left),
            };
            self.advance();
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_logical_and_expression()?;
            left = Expression::LogicalExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                position: position.clone(),
            };
        }
    }

    fn parse_logical_and_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_equality_expression()?;
        let mut chain = 0;
        while self.match_punctuator(Punctuator::AndAnd) {
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_equality_expression()?;
            left = Expression::LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
                position: position.clone(),
            };
        }
        Ok(left)
    }

    fn binary(
        left: Expression,
        operator: BinaryOperator,
        right: Expression,
        position: &SourcePosition,
    ) -> Expression {
        Expression::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            position: position.clone(),
        }
    }

    fn parse_equality_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_relational_expression()?;
        let mut chain = 0;
        loop {
            let operator = match self.peek() {
                Token::Punctuator(Punctuator::EqEq) => BinaryOperator::Eq,
                Token::Punctuator(Punctuator::NotEq) => BinaryOperator::NotEq,
                Token::Punctuator(Punctuator::EqEqEq) => BinaryOperator::StrictEq,
                Token::Punctuator(Punctuator::NotEqEq) => BinaryOperator::StrictNotEq,
                _ => return Ok(left),
            };
            self.advance();
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_relational_expression()?;
            left = Self::binary(left, operator, right, &position);
        }
    }

    fn parse_relational_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_additive_expression()?;
        let mut chain = 0;
        loop {
            let operator = match self.peek() {
                Token::Punctuator(Punctuator::Lt) => BinaryOperator::Lt,
                Token::Punctuator(Punctuator::LtEq) => BinaryOperator::LtEq,
                Token::Punctuator(Punctuator::Gt) => BinaryOperator::Gt,
                Token::Punctuator(Punctuator::GtEq) => BinaryOperator::GtEq,
                Token::Keyword(Keyword::Instanceof) => BinaryOperator::InstanceOf,
                Token::Keyword(Keyword::In) => BinaryOperator::In,
                _ => return Ok(left),
            };
            self.advance();
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_additive_expression()?;
            left = Self::binary(left, operator, right, &position);
        }
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_multiplicative_expression()?;
        let mut chain = 0;
        loop {
            let operator = match self.peek() {
                Token::Punctuator(Punctuator::Plus) => BinaryOperator::Add,
                Token::Punctuator(Punctuator::Minus) => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_multiplicative_expression()?;
            left = Self::binary(left, operator, right, &position);
        }
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let mut left = self.parse_unary_expression()?;
        let mut chain = 0;
        loop {
            let operator = match self.peek() {
                Token::Punctuator(Punctuator::Star) => BinaryOperator::Mul,
                Token::Punctuator(Punctuator::Slash) => BinaryOperator::Div,
                Token::Punctuator(Punctuator::Percent) => BinaryOperator::Mod,
                _ => return Ok(left),
            };
            self.advance();
            chain += 1;
            self.check_chain(chain)?;
            let right = self.parse_unary_expression()?;
            left = Self::binary(left, operator, right, &position);
        }
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        self.nested(Self::parse_unary_expression_at_depth)
    }

    fn parse_unary_expression_at_depth(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let operator = match self.peek() {
            Token::Punctuator(Punctuator::Minus) => UnaryOperator::Minus,
            Token::Punctuator(Punctuator::Plus) => UnaryOperator::Plus,
            Token::Punctuator(Punctuator::Not) => UnaryOperator::Not,
            Token::Keyword(Keyword::Typeof) => UnaryOperator::Typeof,
            Token::Keyword(Keyword::Void) => UnaryOperator::Void,
            Token::Keyword(Keyword::Delete) => UnaryOperator::Delete,
            Token::Punctuator(Punctuator::PlusPlus) | Token::Punctuator(Punctuator::MinusMinus) => {
                let operator = if self.check_punctuator(Punctuator::PlusPlus) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.advance();
                let argument = self.parse_unary_expression()?;
                if !argument.is_assignment_target() {
                    return Err(syntax_error(
                        "Invalid left-hand side expression in prefix operation",
                        Some(position),
                    ));
                }
                return Ok(Expression::UpdateExpression {
                    operator,
                    prefix: true,
                    argument: Box::new(argument),
                    position,
                });
            }
            _ => return self.parse_postfix_expression(),
        };
        self.advance();
        let argument = self.parse_unary_expression()?;
        Ok(Expression::UnaryExpression {
            operator,
            argument: Box::new(argument),
            position,
        })
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        let expression = self.parse_call_expression()?;
        let operator = match self.peek() {
            Token::Punctuator(Punctuator::PlusPlus) if !self.newline_before() => UpdateOperator::Increment,
            Token::Punctuator(Punctuator::MinusMinus) if !self.newline_before() => UpdateOperator::Decrement,
            _ => return Ok(expression),
        };
        if !expression.is_assignment_target() {
            return Err(syntax_error(
                "Invalid left-hand side expression in postfix operation",
                Some(position),
            ));
        }
        self.advance();
        Ok(Expression::UpdateExpression {
            operator,
            prefix: false,
            argument: Box::new(expression),
            position,
        })
    }

    fn parse_call_expression(&mut self) -> Result<Expression, JsError> {
        let mut expression = if self.check_keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        loop {
            let position = self.position();
            if self.match_punctuator(Punctuator::Dot) {
                let name = self.expect_property_name()?;
                expression = Expression::MemberExpression {
                    object: Box::new(expression),
                    property: MemberProperty::Named(name),
                    position,
                };
            } else if self.match_punctuator(Punctuator::LBracket) {
                let property = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RBracket)?;
                expression = Expression::MemberExpression {
                    object: Box::new(expression),
                    property: MemberProperty::Computed(Box::new(property)),
                    position,
                };
            } else if self.check_punctuator(Punctuator::LParen) {
                let arguments = self.parse_arguments()?;
                expression = Expression::CallExpression {
                    callee: Box::new(expression),
                    arguments,
                    position,
                };
            } else if let Token::Template(parts) = self.peek().clone() {
                return Err(syntax_error(
                    format!("Tagged templates are not supported ({} parts)", parts.len()),
                    Some(position),
                ));
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_new_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        self.advance();
        let mut callee = if self.check_keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        loop {
            let member_position = self.position();
            if self.match_punctuator(Punctuator::Dot) {
                let name = self.expect_property_name()?;
                callee = Expression::MemberExpression {
                    object: Box::new(callee),
                    property: MemberProperty::Named(name),
                    position: member_position,
                };
            } else if self.match_punctuator(Punctuator::LBracket) {
                let property = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RBracket)?;
                callee = Expression::MemberExpression {
                    object: Box::new(callee),
                    property: MemberProperty::Computed(Box::new(property)),
                    position: member_position,
                };
            } else {
                break;
            }
        }
        let arguments = if self.check_punctuator(Punctuator::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::NewExpression {
            callee: Box::new(callee),
            arguments,
            position,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut arguments = Vec::new();
        while !self.check_punctuator(Punctuator::RParen) {
            arguments.push(self.parse_assignment_expression()?);
            if !self.match_punctuator(Punctuator::Comma) {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RParen)?;
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier { name, position })
            }
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal {
                    value: Literal::Number(n),
                    position,
                })
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal {
                    value: Literal::String(s),
                    position,
                })
            }
            Token::Template(parts) => {
                self.advance();
                self.build_template(parts, position)
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expression::Literal {
                    value: Literal::Boolean(true),
                    position,
                })
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expression::Literal {
                    value: Literal::Boolean(false),
                    position,
                })
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expression::Literal {
                    value: Literal::Null,
                    position,
                })
            }
            Token::Keyword(Keyword::This) => {
                self.advance();
                Ok(Expression::ThisExpression { position })
            }
            Token::Keyword(Keyword::Function) => {
                self.advance();
                let name = match self.peek().clone() {
                    Token::Identifier(name) => {
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                let function = self.parse_function_rest(name, position.clone())?;
                Ok(Expression::FunctionExpression {
                    function: Rc::new(function),
                    position,
                })
            }
            Token::Punctuator(Punctuator::LParen) => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RParen)?;
                Ok(expression)
            }
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_literal(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn build_template(
        &self,
        parts: Vec<TemplatePart>,
        position: SourcePosition,
    ) -> Result<Expression, JsError> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => quasis.push(text),
                TemplatePart::Substitution(source) => {
                    let mut parser = Parser::new(&source);
                    parser.nesting = self.nesting + 1;
                    let expression = parser
                        .parse_standalone_expression()
                        .map_err(|e| {
                            syntax_error(
                                format!("Invalid template substitution: {}", e.message),
                                Some(position.clone()),
                            )
                        })?;
                    expressions.push(expression);
                }
            }
        }
        Ok(Expression::TemplateLiteral {
            quasis,
            expressions,
            position,
        })
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        self.expect_punctuator(Punctuator::LBracket)?;
        let mut elements = Vec::new();
        while !self.check_punctuator(Punctuator::RBracket) {
            if self.match_punctuator(Punctuator::Comma) {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment_expression()?));
            if !self.match_punctuator(Punctuator::Comma) {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RBracket)?;
        Ok(Expression::ArrayExpression { elements, position })
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, JsError> {
        match self.peek().clone() {
            Token::String(s) => {
                self.advance();
                Ok(PropertyKey::Static(s))
            }
            Token::Number(n) => {
                self.advance();
                Ok(PropertyKey::Static(number_key(n)))
            }
            Token::Punctuator(Punctuator::LBracket) => {
                self.advance();
                let expression = self.parse_assignment_expression()?;
                self.expect_punctuator(Punctuator::RBracket)?;
                Ok(PropertyKey::Computed(expression))
            }
            _ => self.expect_property_name().map(PropertyKey::Static),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let position = self.position();
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut properties = Vec::new();
        while !self.check_punctuator(Punctuator::RBrace) {
            let property_position = self.position();
            // get/set accessors, unless `get` itself is the key
            let accessor = match self.peek() {
                Token::Identifier(w) if w == "get" => Some(PropertyKind::Get),
                Token::Identifier(w) if w == "set" => Some(PropertyKind::Set),
                _ => None,
            };
            let is_accessor = accessor.is_some()
                && !matches!(
                    self.peek_at(1),
                    Token::Punctuator(Punctuator::Colon)
                        | Token::Punctuator(Punctuator::LParen)
                        | Token::Punctuator(Punctuator::Comma)
                        | Token::Punctuator(Punctuator::RBrace)
                );
            if let (true, Some(kind)) = (is_accessor, accessor) {
                self.advance();
                let key = self.parse_property_key()?;
                let name = match &key {
                    PropertyKey::Static(name) => Some(name.clone()),
                    PropertyKey::Computed(_) => None,
                };
                let function = self.parse_function_rest(name, property_position.clone())?;
                properties.push(ObjectProperty {
                    key,
                    value: Expression::FunctionExpression {
                        function: Rc::new(function),
                        position: property_position,
                    },
                    kind,
                });
            } else {
                let shorthand = match self.peek() {
                    Token::Identifier(name)
                        if matches!(
                            self.peek_at(1),
                            Token::Punctuator(Punctuator::Comma) | Token::Punctuator(Punctuator::RBrace)
                        ) =>
                    {
                        Some(name.clone())
                    }
                    _ => None,
                };
                if let Some(name) = shorthand {
                    self.advance();
                    properties.push(ObjectProperty {
                        key: PropertyKey::Static(name.clone()),
                        value: Expression::Identifier {
                            name,
                            position: property_position,
                        },
                        kind: PropertyKind::Init,
                    });
                } else {
                    let key = self.parse_property_key()?;
                    let value = if self.check_punctuator(Punctuator::LParen) {
                        let name = match &key {
                            PropertyKey::Static(name) => Some(name.clone()),
                            PropertyKey::Computed(_) => None,
                        };
                        let function = self.parse_function_rest(name, property_position.clone())?;
                        Expression::FunctionExpression {
                            function: Rc::new(function),
                            position: property_position,
                        }
                    } else {
                        self.expect_punctuator(Punctuator::Colon)?;
                        self.parse_assignment_expression()?
                    };
                    properties.push(ObjectProperty {
                        key,
                        value,
                        kind: PropertyKind::Init,
                    });
                }
            }
            if !self.match_punctuator(Punctuator::Comma) {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RBrace)?;
        Ok(Expression::ObjectExpression {
            properties,
            position,
        })
    }
}

/// Canonical string form of a numeric object key.
fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

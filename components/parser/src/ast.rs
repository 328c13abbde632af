//! Abstract Syntax Tree node definitions

use core_types::SourcePosition;
use std::rc::Rc;

/// A parsed script
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top level statements in source order
    pub body: Vec<Statement>,
}

/// Script statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (let, const, var)
    VariableDeclaration {
        /// Declaration kind (let, const, var)
        kind: VariableKind,
        /// List of declarators
        declarations: Vec<VariableDeclarator>,
        /// Source location
        position: SourcePosition,
    },

    /// Function declaration
    FunctionDeclaration {
        /// The function; the name is always present
        function: Rc<FunctionNode>,
        /// Source location
        position: SourcePosition,
    },

    /// Expression statement
    ExpressionStatement {
        /// The expression
        expression: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// Return statement
    ReturnStatement {
        /// Return value
        argument: Option<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// If statement
    IfStatement {
        /// Condition
        test: Expression,
        /// Consequent block
        consequent: Box<Statement>,
        /// Alternate block
        alternate: Option<Box<Statement>>,
        /// Source location
        position: SourcePosition,
    },

    /// While loop
    WhileStatement {
        /// Loop condition
        test: Expression,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Do-while loop
    DoWhileStatement {
        /// Loop body
        body: Box<Statement>,
        /// Loop condition
        test: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// Classic three-clause for loop
    ForStatement {
        /// Initializer
        init: Option<ForInit>,
        /// Loop condition
        test: Option<Expression>,
        /// Update expression
        update: Option<Expression>,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// for (x in obj)
    ForInStatement {
        /// Declaration kind if the binding is declared in the loop head
        kind: Option<VariableKind>,
        /// Bound name
        binding: String,
        /// Object whose keys are enumerated
        object: Expression,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// for (x of iterable)
    ForOfStatement {
        /// Declaration kind if the binding is declared in the loop head
        kind: Option<VariableKind>,
        /// Bound name
        binding: String,
        /// Iterated value
        iterable: Expression,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Block statement
    BlockStatement {
        /// Statements in the block
        body: Vec<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Empty statement (;)
    EmptyStatement {
        /// Source location
        position: SourcePosition,
    },

    /// Break statement
    BreakStatement {
        /// Source location
        position: SourcePosition,
    },

    /// Continue statement
    ContinueStatement {
        /// Source location
        position: SourcePosition,
    },

    /// Throw statement
    ThrowStatement {
        /// Thrown value
        argument: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// Try statement
    TryStatement {
        /// Protected block
        block: Vec<Statement>,
        /// Catch clause
        handler: Option<CatchClause>,
        /// Finally block
        finalizer: Option<Vec<Statement>>,
        /// Source location
        position: SourcePosition,
    },
}

impl Statement {
    /// Location of the statement in the source.
    pub fn position(&self) -> &SourcePosition {
        match self {
            Statement::VariableDeclaration { position, .. }
            | Statement::FunctionDeclaration { position, .. }
            | Statement::ExpressionStatement { position, .. }
            | Statement::ReturnStatement { position, .. }
            | Statement::IfStatement { position, .. }
            | Statement::WhileStatement { position, .. }
            | Statement::DoWhileStatement { position, .. }
            | Statement::ForStatement { position, .. }
            | Statement::ForInStatement { position, .. }
            | Statement::ForOfStatement { position, .. }
            | Statement::BlockStatement { position, .. }
            | Statement::EmptyStatement { position }
            | Statement::BreakStatement { position }
            | Statement::ContinueStatement { position }
            | Statement::ThrowStatement { position, .. }
            | Statement::TryStatement { position, .. } => position,
        }
    }
}

/// Initializer clause of a for loop
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// `for (let i = 0; ...)`
    VariableDeclaration {
        /// Declaration kind
        kind: VariableKind,
        /// Declarators
        declarations: Vec<VariableDeclarator>,
    },
    /// `for (i = 0; ...)`
    Expression(Expression),
}

/// Catch clause of a try statement
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Bound exception name, absent for `catch { }`
    pub param: Option<String>,
    /// Handler body
    pub body: Vec<Statement>,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// let
    Let,
    /// const
    Const,
    /// var
    Var,
}

/// Single `name = init` in a declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Declared name
    pub name: String,
    /// Initializer
    pub init: Option<Expression>,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Default value used when the argument is undefined
    pub default: Option<Expression>,
    /// `...rest` parameter
    pub rest: bool,
}

/// Body of a function
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `{ ... }`
    Block(Vec<Statement>),
    /// Concise arrow body
    Expression(Box<Expression>),
}

/// Shared description of a function literal, declaration or arrow
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    /// Function name
    pub name: Option<String>,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Function body
    pub body: FunctionBody,
    /// Arrow functions capture `this` lexically
    pub is_arrow: bool,
    /// Source location
    pub position: SourcePosition,
}

/// Script expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Identifier reference
    Identifier {
        /// Identifier name
        name: String,
        /// Source location
        position: SourcePosition,
    },

    /// Literal value
    Literal {
        /// Literal value
        value: Literal,
        /// Source location
        position: SourcePosition,
    },

    /// Template literal; `quasis` has one more entry than `expressions`
    TemplateLiteral {
        /// Text segments
        quasis: Vec<String>,
        /// Substituted expressions
        expressions: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `this`
    ThisExpression {
        /// Source location
        position: SourcePosition,
    },

    /// Array literal
    ArrayExpression {
        /// Elements; holes are `None`
        elements: Vec<Option<Expression>>,
        /// Source location
        position: SourcePosition,
    },

    /// Object literal
    ObjectExpression {
        /// Properties
        properties: Vec<ObjectProperty>,
        /// Source location
        position: SourcePosition,
    },

    /// Function expression or arrow function
    FunctionExpression {
        /// The function
        function: Rc<FunctionNode>,
        /// Source location
        position: SourcePosition,
    },

    /// Unary operation
    UnaryExpression {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        argument: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// ++ / --
    UpdateExpression {
        /// Operator
        operator: UpdateOperator,
        /// Prefix or postfix
        prefix: bool,
        /// Target
        argument: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Binary operation
    BinaryExpression {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Short-circuit operation
    LogicalExpression {
        /// Operator
        operator: LogicalOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Assignment
    AssignmentExpression {
        /// Operator
        operator: AssignmentOperator,
        /// Target (identifier or member expression)
        left: Box<Expression>,
        /// Assigned value
        right: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// test ? consequent : alternate
    ConditionalExpression {
        /// Condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Property access
    MemberExpression {
        /// Object
        object: Box<Expression>,
        /// Accessed property
        property: MemberProperty,
        /// Source location
        position: SourcePosition,
    },

    /// Function call
    CallExpression {
        /// Callee
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Constructor call
    NewExpression {
        /// Constructor
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Comma-separated expressions
    SequenceExpression {
        /// Expressions evaluated in order
        expressions: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },
}

impl Expression {
    /// Location of the expression in the source.
    pub fn position(&self) -> &SourcePosition {
        match self {
            Expression::Identifier { position, .. }
            | Expression::Literal { position, .. }
            | Expression::TemplateLiteral { position, .. }
            | Expression::ThisExpression { position }
            | Expression::ArrayExpression { position, .. }
            | Expression::ObjectExpression { position, .. }
            | Expression::FunctionExpression { position, .. }
            | Expression::UnaryExpression { position, .. }
            | Expression::UpdateExpression { position, .. }
            | Expression::BinaryExpression { position, .. }
            | Expression::LogicalExpression { position, .. }
            | Expression::AssignmentExpression { position, .. }
            | Expression::ConditionalExpression { position, .. }
            | Expression::MemberExpression { position, .. }
            | Expression::CallExpression { position, .. }
            | Expression::NewExpression { position, .. }
            | Expression::SequenceExpression { position, .. } => position,
        }
    }

    /// Whether the expression may appear on the left of `=`.
    pub fn is_assignment_target(&self) -> bool {
        matches!(
            self,
            Expression::Identifier { .. } | Expression::MemberExpression { .. }
        )
    }
}

/// Property of a member expression
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `obj.name`
    Named(String),
    /// `obj[expr]`
    Computed(Box<Expression>),
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
}

/// Key of an object literal property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier, string or number key, already converted to its string form
    Static(String),
    /// `[expr]`
    Computed(Expression),
}

/// What an object literal property defines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `key: value`, shorthand or method
    Init,
    /// `get key() {}`
    Get,
    /// `set key(v) {}`
    Set,
}

/// Object literal property
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    /// Property key
    pub key: PropertyKey,
    /// Property value (a function expression for accessors)
    pub value: Expression,
    /// Property kind
    pub kind: PropertyKind,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Mod,
    /// ==
    Eq,
    /// !=
    NotEq,
    /// ===
    StrictEq,
    /// !==
    StrictNotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// instanceof
    InstanceOf,
    /// in
    In,
}

/// Short-circuit operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
    /// ??
    NullishCoalescing,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// -
    Minus,
    /// +
    Plus,
    /// !
    Not,
    /// typeof
    Typeof,
    /// void
    Void,
    /// delete
    Delete,
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// =
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubAssign,
    /// *=
    MulAssign,
    /// /=
    DivAssign,
    /// %=
    ModAssign,
}

impl AssignmentOperator {
    /// Binary operator applied by a compound assignment.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubAssign => Some(BinaryOperator::Sub),
            AssignmentOperator::MulAssign => Some(BinaryOperator::Mul),
            AssignmentOperator::DivAssign => Some(BinaryOperator::Div),
            AssignmentOperator::ModAssign => Some(BinaryOperator::Mod),
        }
    }
}

use serde::Serialize;

use crate::span::{Span, Spanned};
use crate::typeck::types::{QuackType, TypeTable};

/// A Quack program: class declarations in any order, followed by the
/// top-level statement block.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub classes: Vec<Spanned<ClassDecl>>,
    pub statements: Spanned<Block>,
}

impl Program {
    /// JSON rendering of the whole tree, every node tagged with its kind.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    /// Explicit `extends` target, or `Obj` with a dummy span when omitted.
    pub superclass: Spanned<String>,
    /// The class body statements and the class formals, shaped as a method
    /// named after the class that returns the class.
    pub constructor: Spanned<MethodDecl>,
    pub methods: Vec<Spanned<MethodDecl>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    /// `None` means the return type is inferred from `return` statements.
    pub return_type: Option<Spanned<String>>,
    pub body: Spanned<Block>,
}

impl MethodDecl {
    pub fn formal_types(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.node.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    Assign {
        target: Spanned<LExpr>,
        value: Spanned<Expr>,
    },
    AssignDeclare {
        target: Spanned<LExpr>,
        static_type: Spanned<String>,
        value: Spanned<Expr>,
    },
    Return {
        value: Option<Spanned<Expr>>,
    },
    If {
        cond: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Spanned<Block>,
    },
    While {
        cond: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Typecase {
        scrutinee: Spanned<Expr>,
        alternatives: Vec<TypeAlternative>,
    },
    Expr {
        expr: Spanned<Expr>,
    },
}

impl Stmt {
    /// Seed `vars` with a `Bottom` placeholder for every `this.f` assigned by
    /// this statement. Nested blocks are only scanned when `nested` is set.
    pub fn collect_vars(&self, vars: &mut TypeTable, nested: bool) {
        match self {
            Stmt::Assign { target, .. } | Stmt::AssignDeclare { target, .. } => {
                if let Some(field) = target.node.this_field() {
                    vars.entry(field.to_string()).or_insert(QuackType::Bottom);
                }
            }
            Stmt::If { then_block, else_block, .. } if nested => {
                then_block.node.collect_vars(vars, nested);
                else_block.node.collect_vars(vars, nested);
            }
            Stmt::While { body, .. } if nested => body.node.collect_vars(vars, nested),
            Stmt::Typecase { alternatives, .. } if nested => {
                for alt in alternatives {
                    alt.block.node.collect_vars(vars, nested);
                }
            }
            _ => {}
        }
    }
}

impl Block {
    pub fn collect_vars(&self, vars: &mut TypeTable, nested: bool) {
        for stmt in &self.stmts {
            stmt.node.collect_vars(vars, nested);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeAlternative {
    pub ident: Spanned<String>,
    pub class_name: Spanned<String>,
    pub block: Spanned<Block>,
}

/// Assignable locations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum LExpr {
    Ident {
        name: String,
    },
    Field {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
}

impl LExpr {
    /// Location name: `x` for a variable, `this.x` for a field of `this`.
    pub fn get_var(&self) -> String {
        match self {
            LExpr::Ident { name } => name.clone(),
            LExpr::Field { object, field } => format!("{}.{}", object.node.get_var(), field.node),
        }
    }

    /// Field name when this location is `this.<field>`.
    pub fn this_field(&self) -> Option<&str> {
        match self {
            LExpr::Field { object, field } if matches!(object.node, Expr::This) => Some(&field.node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Expr {
    IntConst {
        value: i64,
    },
    StrConst {
        value: String,
    },
    BoolConst {
        value: bool,
    },
    Nothing,
    This,
    Ident {
        name: String,
    },
    Dot {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
    Call {
        receiver: Box<Spanned<Expr>>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    Construct {
        class: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    And {
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Or {
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Not {
        operand: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Operators like `+` and `<` are calls to specially named methods on
    /// the left operand.
    pub fn binop(method: &str, op_span: Span, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Expr {
        Expr::Call {
            receiver: Box::new(lhs),
            method: Spanned::new(method.to_string(), op_span),
            args: vec![rhs],
        }
    }

    pub fn get_var(&self) -> String {
        match self {
            Expr::This => "this".to_string(),
            Expr::Ident { name } => name.clone(),
            Expr::Dot { object, field } => format!("{}.{}", object.node.get_var(), field.node),
            _ => String::new(),
        }
    }
}

/// Method name an infix operator desugars to.
pub fn operator_method(op: &str) -> Option<&'static str> {
    Some(match op {
        "+" => "PLUS",
        "-" => "MINUS",
        "*" => "TIMES",
        "/" => "DIVIDE",
        "<" => "LESS",
        "<=" => "ATMOST",
        ">" => "MORE",
        ">=" => "ATLEAST",
        "==" => "EQUALS",
        _ => return None,
    })
}

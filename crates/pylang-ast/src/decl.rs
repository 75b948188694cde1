//! Declaration definitions for the AST

use super::*;

/// Declarations appearing at module, function, or class level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Decl {
    /// `name: T = literal`
    VarDef { var: TypedVar, value: Expr },

    FuncDef(FuncDef),

    ClassDef(ClassDef),

    /// `global name`
    GlobalDecl { variable: Identifier },

    /// `nonlocal name`
    NonLocalDecl { variable: Identifier },
}

impl Decl {
    /// The identifier this declaration binds.
    pub fn identifier(&self) -> &Identifier {
        match self {
            Decl::VarDef { var, .. } => &var.identifier,
            Decl::FuncDef(func) => &func.name,
            Decl::ClassDef(class) => &class.name,
            Decl::GlobalDecl { variable } | Decl::NonLocalDecl { variable } => variable,
        }
    }

    pub fn name(&self) -> &str {
        &self.identifier().name
    }
}

/// Function or method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: Identifier,
    pub params: Vec<TypedVar>,
    #[serde(rename = "returnType")]
    pub return_type: Node<TypeAnnotation>,
    pub declarations: Vec<Node<Decl>>,
    pub statements: Vec<Node<Stmt>>,
}

/// Class definition; members are attribute `VarDef`s and method `FuncDef`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: Identifier,
    #[serde(rename = "superClass")]
    pub super_class: Identifier,
    pub declarations: Vec<Node<Decl>>,
}

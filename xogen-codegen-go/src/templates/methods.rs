//! Signatures of the generated storage methods.
//!
//! The type, index and foreign-key templates define these methods; the
//! schema template lists the same signatures in the `Storer` interface.

use xogen_codegen::Helpers;
use xogen_ir::{ForeignKey, Index, Type};

use super::{receiver, tracks_existence};

/// One generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Method {
    pub name: String,
    pub params: String,
    pub returns: String,
}

impl Method {
    fn new(name: impl Into<String>, params: impl Into<String>, returns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            returns: returns.into(),
        }
    }

    /// `Name(params) returns`
    pub fn signature(&self) -> String {
        format!("{}({}) {}", self.name, self.params, self.returns)
    }
}

/// Fields written by an update: everything but the primary key.
pub(crate) fn update_fields(ty: &Type) -> Vec<&str> {
    ty.fields
        .iter()
        .filter(|f| !f.col.is_primary_key)
        .map(|f| f.name.as_str())
        .collect()
}

/// Insert, and for tables with a primary key and other columns also
/// update, save, upsert and delete. Views get none.
pub(crate) fn type_methods(h: &mut Helpers<'_>, ty: &Type) -> Vec<Method> {
    if ty.kind != xogen_ir::RelKind::Table {
        return Vec::new();
    }
    let r = receiver(h, &ty.name);
    let params = format!("db XODB, {r} *{}", ty.name);

    let mut methods = vec![Method::new(format!("Insert{}", ty.name), &params, "error")];
    if tracks_existence(ty) {
        if !update_fields(ty).is_empty() {
            for verb in ["Update", "Save", "Upsert"] {
                methods.push(Method::new(format!("{verb}{}", ty.name), &params, "error"));
            }
        }
        methods.push(Method::new(format!("Delete{}", ty.name), &params, "error"));
    }
    methods
}

/// Lookup through `index`: one row for unique indexes, a slice otherwise.
pub(crate) fn index_method(h: &Helpers<'_>, ty: &Type, index: &Index) -> Method {
    let params = format!("db XODB{}", h.goparamlist(&index.fields, true, true, &[]));
    let returns = if index.is_unique {
        format!("(*{}, error)", ty.name)
    } else {
        format!("([]*{}, error)", ty.name)
    };
    Method::new(&index.func_name, params, returns)
}

/// Accessor for the row `fk` references: `<Name>In<Type>`.
pub(crate) fn foreign_key_method(h: &mut Helpers<'_>, fk: &ForeignKey) -> Method {
    let r = receiver(h, &fk.type_name);
    Method::new(
        format!("{}In{}", fk.name, fk.type_name),
        format!("db XODB, {r} *{}", fk.type_name),
        format!("(*{}, error)", fk.ref_type),
    )
}

/// Every method generated for the tables of a definition, in output order.
pub(crate) fn table_methods(h: &mut Helpers<'_>, ty: &Type) -> Vec<Method> {
    let mut methods = type_methods(h, ty);
    for fk in &ty.foreign_keys {
        methods.push(foreign_key_method(h, fk));
    }
    for index in &ty.indexes {
        methods.push(index_method(h, ty, index));
    }
    methods
}

//! Structural declarations - the content of archive entries and capsules.
//!
//! A [`Declaration`] is one named, declaration-bearing unit: the thing an archive
//! entry holds and the payload a capsule carries. Declarations are purely
//! structural; member bodies are opaque byte payloads the pipeline never
//! interprets.

use serde::{Deserialize, Serialize};

/// Access level of a declaration or one of its members.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Parse from the textual form used in directive metadata.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// A field or method inside a declaration.
///
/// For methods, `name` is the full signature string (e.g. `"run(int,string)"`),
/// which is also the collision key during merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub visibility: Visibility,
    pub is_final: bool,
    /// Opaque compiled payload; never inspected by the pipeline.
    pub body: Vec<u8>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_final: false,
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_finality(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }
}

/// One named declaration: the unit of content inside archives and capsules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Qualified entry name, e.g. `"core/Dispatcher"`.
    pub name: String,
    pub visibility: Visibility,
    pub is_final: bool,
    /// Qualified name of the supertype, if the declaration extends one.
    pub supertype: Option<String>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_final: false,
            supertype: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    pub fn with_field(mut self, field: Member) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: Member) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Member> {
        self.fields.iter().find(|m| m.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Member> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.fields.iter_mut().find(|m| m.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.methods.iter_mut().find(|m| m.name == name)
    }
}

/// Split a qualified directive target into its owning entry and member part.
///
/// `"core/Dispatcher"` -> `("core/Dispatcher", None)`
/// `"core/Dispatcher#queue"` -> `("core/Dispatcher", Some("queue"))`
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('#') {
        Some((entry, member)) => (entry, Some(member)),
        None => (target, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trip() {
        for v in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            assert_eq!(Visibility::parse(v.as_str()), Some(v));
        }
        assert_eq!(Visibility::parse("package"), None);
    }

    #[test]
    fn test_member_lookup() {
        let decl = Declaration::new("core/Dispatcher")
            .with_field(Member::new("queue"))
            .with_method(Member::new("run(int)"));

        assert!(decl.field("queue").is_some());
        assert!(decl.method("run(int)").is_some());
        assert!(decl.field("missing").is_none());
        assert!(decl.method("run(string)").is_none());
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("core/Dispatcher"), ("core/Dispatcher", None));
        assert_eq!(
            split_target("core/Dispatcher#queue"),
            ("core/Dispatcher", Some("queue"))
        );
        assert_eq!(
            split_target("core/Dispatcher#run(int,string)"),
            ("core/Dispatcher", Some("run(int,string)"))
        );
    }
}

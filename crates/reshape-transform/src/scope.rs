//! Identifier allocation for generated code.
//!
//! A [`NameScope`] lives for exactly one synthesis call. It hands out
//! collision-free names for helpers and temporaries, and keeps every engine
//! chosen identifier clear of the variables supplied by the caller.

use std::collections::{HashMap, HashSet};

/// Default prefix of helper function names.
pub const DEFAULT_HELPER_PREFIX: &str = "transform";

const LOOP_VARS: &[char] = &[
    'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JMES", "JSON", "JWT", "LHS", "OK", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH",
    "TCP", "TLS", "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP",
    "XSRF", "XSS",
];

const RESERVED: &[&str] = &[
    // keywords
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
    // predeclared
    "any", "append", "bool", "byte", "cap", "close", "complex", "complex64", "complex128", "copy",
    "delete", "error", "false", "float32", "float64", "imag", "int", "int8", "int16", "int32",
    "int64", "iota", "len", "make", "new", "nil", "panic", "print", "println", "real", "recover",
    "rune", "string", "true", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
];

/// Per-invocation name allocator.
#[derive(Debug, Default)]
pub struct NameScope {
    counts: HashMap<String, usize>,
    taken: HashSet<String>,
    reserved: HashSet<String>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a caller identifier as off limits. Only the root identifier of
    /// an expression such as `source.Items[0]` is recorded.
    pub fn reserve(&mut self, expr: &str) {
        let root: String = expr
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !root.is_empty() {
            self.taken.insert(root.clone());
            self.reserved.insert(root);
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// `base` the first time, then `base2`, `base3`, ... Never returns a
    /// reserved name or a name handed out before.
    pub fn unique_name(&mut self, base: &str) -> String {
        loop {
            let count = self.counts.entry(base.to_string()).or_insert(0);
            *count += 1;
            let candidate = if *count == 1 {
                base.to_string()
            } else {
                format!("{base}{count}")
            };
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// A conventional block-local name (`val`, `key`, `tk`, ...). Locals may
    /// shadow each other in nested blocks, so only reserved names are avoided.
    pub fn local(&self, base: &str) -> String {
        if !self.is_reserved(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.is_reserved(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Index variable of the array loop nested `depth` arrays deep.
    pub fn array_loop_var(&self, depth: usize) -> String {
        let letter = LOOP_VARS[depth % LOOP_VARS.len()];
        let round = depth / LOOP_VARS.len();
        let base = if round == 0 {
            letter.to_string()
        } else {
            format!("{letter}{round}")
        };
        self.local(&base)
    }

    /// Value temporary of a map whose element nests `depth` further maps.
    pub fn map_value_var(&self, depth: usize) -> String {
        let base = match depth {
            0 => "tv".to_string(),
            1..=25 => format!("tv{}", (b'a' + depth as u8) as char),
            _ => format!("tv{depth}"),
        };
        self.local(&base)
    }

    /// Name of the helper converting `source` into `target`.
    pub fn helper_name(prefix: &str, source: &str, target: &str) -> String {
        let prefix = if prefix.is_empty() {
            DEFAULT_HELPER_PREFIX
        } else {
            prefix
        };
        goify(
            &format!("{prefix}{}To{}", goify(source, true), goify(target, true)),
            false,
        )
    }
}

/// Turn an arbitrary name into a Go identifier.
///
/// Characters other than letters and digits split words and are dropped,
/// words are camel-cased, common initialisms are kept upper case and Go
/// reserved words get a trailing underscore.
pub fn goify(name: &str, first_upper: bool) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in split_words(name).iter().enumerate() {
        let upper = word.to_uppercase();
        if INITIALISMS.contains(&upper.as_str()) {
            if i == 0 && !first_upper {
                out.push_str(&word.to_lowercase());
            } else {
                out.push_str(&upper);
            }
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i > 0 || first_upper {
                out.extend(first.to_uppercase());
            } else {
                out.extend(first.to_lowercase());
            }
            out.push_str(chars.as_str());
        }
    }
    if RESERVED.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Words end at separators and at a lower case letter followed by anything
/// that is not lower case.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if prev_lower && !c.is_lowercase() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_lower = c.is_lowercase();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_counts_collisions() {
        let mut scope = NameScope::new();
        assert_eq!(scope.unique_name("tmp"), "tmp");
        assert_eq!(scope.unique_name("tmp"), "tmp2");
        assert_eq!(scope.unique_name("tmp"), "tmp3");
        assert_eq!(scope.unique_name("other"), "other");
    }

    #[test]
    fn unique_name_skips_reserved_and_issued() {
        let mut scope = NameScope::new();
        scope.reserve("js.Field");
        assert_eq!(scope.unique_name("js"), "js2");
        assert_eq!(scope.unique_name("js2"), "js22");
    }

    #[test]
    fn scopes_are_independent() {
        let mut a = NameScope::new();
        let mut b = NameScope::new();
        assert_eq!(a.unique_name("x"), "x");
        assert_eq!(a.unique_name("x"), "x2");
        assert_eq!(b.unique_name("x"), "x");
    }

    #[test]
    fn loop_vars_by_depth() {
        let scope = NameScope::new();
        assert_eq!(scope.array_loop_var(0), "i");
        assert_eq!(scope.array_loop_var(1), "j");
        assert_eq!(scope.array_loop_var(17), "z");
        assert_eq!(scope.array_loop_var(18), "i1");
    }

    #[test]
    fn loop_vars_avoid_caller_names() {
        let mut scope = NameScope::new();
        scope.reserve("i");
        scope.reserve("val");
        assert_eq!(scope.array_loop_var(0), "i2");
        assert_eq!(scope.local("val"), "val2");
        assert_eq!(scope.local("key"), "key");
    }

    #[test]
    fn map_value_vars_by_depth() {
        let scope = NameScope::new();
        assert_eq!(scope.map_value_var(0), "tv");
        assert_eq!(scope.map_value_var(1), "tvb");
        assert_eq!(scope.map_value_var(2), "tvc");
    }

    #[test]
    fn helper_names() {
        assert_eq!(
            NameScope::helper_name("", "Simple", "Simple"),
            "transformSimpleToSimple"
        );
        assert_eq!(
            NameScope::helper_name("transform", "Simple", "mypkg.Simple"),
            "transformSimpleToMypkgSimple"
        );
        assert_eq!(
            NameScope::helper_name("unmarshal", "body", "user_profile"),
            "unmarshalBodyToUserProfile"
        );
    }

    #[test]
    fn goify_names() {
        assert_eq!(goify("required_string", true), "RequiredString");
        assert_eq!(goify("RequiredString", false), "requiredString");
        assert_eq!(goify("user id", true), "UserID");
        assert_eq!(goify("id", false), "id");
        assert_eq!(goify("type", false), "type_");
        assert_eq!(goify("type", true), "Type");
        assert_eq!(goify("my-field", true), "MyField");
        assert_eq!(goify("fooBar", true), "FooBar");
    }
}

//! Grammars bundled through `ast-grep-language`.
//!
//! Only the tree-sitter grammars are taken from ast-grep; pattern matching
//! is implemented by this crate.

use crate::grammar::language::{Grammar, Language, WrappedFragment};
use ast_grep_language::{LanguageExt, SupportLang};

/// A grammar shipped with `ast-grep-language`.
pub struct BuiltinGrammar {
    lang: SupportLang,
    language: Language,
    ts_language: tree_sitter::Language,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
}

impl BuiltinGrammar {
    pub fn new(lang: SupportLang) -> Self {
        let language = Language::new(&format!("{lang:?}"));
        let (aliases, extensions) = naming(language.as_str());
        Self {
            lang,
            ts_language: lang.get_ts_language(),
            language,
            aliases,
            extensions,
        }
    }

    /// Every grammar bundled by `ast-grep-language`.
    pub fn all() -> Vec<Self> {
        SupportLang::all_langs()
            .iter()
            .copied()
            .map(Self::new)
            .collect()
    }

    pub fn support_lang(&self) -> SupportLang {
        self.lang
    }
}

impl Grammar for BuiltinGrammar {
    fn language(&self) -> &Language {
        &self.language
    }

    fn ts_language(&self) -> &tree_sitter::Language {
        &self.ts_language
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn wrap_fragment(&self, fragment: &str) -> Option<WrappedFragment> {
        match self.language.as_str() {
            "rust" => Some(WrappedFragment::new(
                "fn __sg_wrapper__() { ",
                fragment,
                " }",
            )),
            "javascript" | "typescript" | "tsx" => Some(WrappedFragment::new(
                "function __sg_wrapper__() { ",
                fragment,
                " }",
            )),
            "go" => Some(WrappedFragment::new(
                "func __sg_wrapper__() {\n",
                fragment,
                "\n}",
            )),
            "c" | "cpp" => Some(WrappedFragment::new(
                "void __sg_wrapper__() { ",
                fragment,
                " }",
            )),
            "java" => Some(WrappedFragment::new(
                "class SgWrapper { void __sg_wrapper__() { ",
                fragment,
                " } }",
            )),
            "csharp" => Some(WrappedFragment::new(
                "class SgWrapper { void SgWrapperMethod() { ",
                fragment,
                " } }",
            )),
            "kotlin" => Some(WrappedFragment::new(
                "fun __sg_wrapper__() { ",
                fragment,
                " }",
            )),
            "swift" => Some(WrappedFragment::new(
                "func __sg_wrapper__() { ",
                fragment,
                " }",
            )),
            // Indentation-sensitive: only single-line fragments can be nested.
            "python" if !fragment.contains('\n') => Some(WrappedFragment::new(
                "def __sg_wrapper__():\n    ",
                fragment,
                "\n",
            )),
            _ => None,
        }
    }

    fn prefers_wrapped(&self) -> bool {
        matches!(self.language.as_str(), "go" | "c" | "cpp")
    }
}

fn naming(name: &str) -> (&'static [&'static str], &'static [&'static str]) {
    match name {
        "bash" => (&["sh", "shell"], &["sh", "bash", "zsh"]),
        "c" => (&[], &["c", "h"]),
        "cpp" => (&["c++", "cc", "cxx"], &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
        "csharp" => (&["cs", "c#"], &["cs"]),
        "css" => (&[], &["css", "scss"]),
        "elixir" => (&["ex"], &["ex", "exs"]),
        "go" => (&["golang"], &["go"]),
        "haskell" => (&["hs"], &["hs"]),
        "hcl" => (&["terraform"], &["hcl", "tf"]),
        "html" => (&["htm"], &["html", "htm"]),
        "java" => (&[], &["java"]),
        "javascript" => (&["js", "jsx"], &["js", "jsx", "mjs", "cjs"]),
        "json" => (&[], &["json"]),
        "kotlin" => (&["kt"], &["kt", "kts"]),
        "lua" => (&[], &["lua"]),
        "nix" => (&[], &["nix"]),
        "php" => (&[], &["php"]),
        "python" => (&["py"], &["py", "pyi"]),
        "ruby" => (&["rb"], &["rb"]),
        "rust" => (&["rs"], &["rs"]),
        "scala" => (&[], &["scala", "sc"]),
        "solidity" => (&["sol"], &["sol"]),
        "swift" => (&[], &["swift"]),
        "tsx" => (&[], &["tsx"]),
        "typescript" => (&["ts"], &["ts", "mts", "cts"]),
        "yaml" => (&["yml"], &["yaml", "yml"]),
        _ => (&[], &[]),
    }
}

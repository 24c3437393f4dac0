//! Source languages and language standards.

use serde::{Deserialize, Serialize};

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language
    C,
    /// C++ language
    #[serde(alias = "cpp", alias = "cxx", alias = "c++")]
    Cpp,
    /// Assembly
    #[serde(alias = "s")]
    Asm,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Asm => "ASM",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// C standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CStandard {
    /// C89 (also known as C90, ANSI C)
    #[serde(rename = "89", alias = "c89", alias = "90", alias = "c90")]
    C89,
    /// C99
    #[serde(rename = "99", alias = "c99")]
    C99,
    /// C11
    #[serde(rename = "11", alias = "c11")]
    C11,
    /// C17 (also known as C18)
    #[serde(rename = "17", alias = "c17", alias = "18", alias = "c18")]
    C17,
    /// C23
    #[serde(rename = "23", alias = "c23")]
    C23,
}

impl CStandard {
    /// Get the standard as a compiler flag value (e.g., "c11").
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CStandard::C89 => "c89",
            CStandard::C99 => "c99",
            CStandard::C11 => "c11",
            CStandard::C17 => "c17",
            CStandard::C23 => "c23",
        }
    }
}

impl std::str::FromStr for CStandard {
    type Err = StandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "89" | "c89" | "90" | "c90" => Ok(CStandard::C89),
            "99" | "c99" => Ok(CStandard::C99),
            "11" | "c11" => Ok(CStandard::C11),
            "17" | "c17" | "18" | "c18" => Ok(CStandard::C17),
            "23" | "c23" => Ok(CStandard::C23),
            _ => Err(StandardParseError {
                value: s.to_string(),
                expected: "89, 99, 11, 17, 23",
            }),
        }
    }
}

impl std::fmt::Display for CStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", &self.as_flag_value()[1..])
    }
}

/// C++ standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CppStandard {
    /// C++98
    #[serde(rename = "98", alias = "c++98")]
    Cpp98,
    /// C++03
    #[serde(rename = "03", alias = "c++03")]
    Cpp03,
    /// C++11
    #[serde(rename = "11", alias = "c++11")]
    Cpp11,
    /// C++14
    #[serde(rename = "14", alias = "c++14")]
    Cpp14,
    /// C++17
    #[serde(rename = "17", alias = "c++17")]
    Cpp17,
    /// C++20
    #[serde(rename = "20", alias = "c++20")]
    Cpp20,
    /// C++23
    #[serde(rename = "23", alias = "c++23")]
    Cpp23,
}

impl CppStandard {
    /// Get the standard as a compiler flag value (e.g., "c++17").
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CppStandard::Cpp98 => "c++98",
            CppStandard::Cpp03 => "c++03",
            CppStandard::Cpp11 => "c++11",
            CppStandard::Cpp14 => "c++14",
            CppStandard::Cpp17 => "c++17",
            CppStandard::Cpp20 => "c++20",
            CppStandard::Cpp23 => "c++23",
        }
    }
}

impl std::str::FromStr for CppStandard {
    type Err = StandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "98" | "c++98" => Ok(CppStandard::Cpp98),
            "03" | "c++03" => Ok(CppStandard::Cpp03),
            "11" | "c++11" => Ok(CppStandard::Cpp11),
            "14" | "c++14" => Ok(CppStandard::Cpp14),
            "17" | "c++17" => Ok(CppStandard::Cpp17),
            "20" | "c++20" => Ok(CppStandard::Cpp20),
            "23" | "c++23" => Ok(CppStandard::Cpp23),
            _ => Err(StandardParseError {
                value: s.to_string(),
                expected: "98, 03, 11, 14, 17, 20, 23",
            }),
        }
    }
}

impl std::fmt::Display for CppStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C++{}", &self.as_flag_value()[3..])
    }
}

/// Error returned when parsing an invalid standard string.
#[derive(Debug, Clone)]
pub struct StandardParseError {
    pub value: String,
    pub expected: &'static str,
}

impl std::fmt::Display for StandardParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid language standard '{}', valid values: {}",
            self.value, self.expected
        )
    }
}

impl std::error::Error for StandardParseError {}

/// Language standard of a configured compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standard {
    /// Assembly has no standard flag.
    Asm,
    C(CStandard),
    Cpp(CppStandard),
}

impl Standard {
    /// The language this standard belongs to.
    pub fn language(&self) -> Language {
        match self {
            Standard::Asm => Language::Asm,
            Standard::C(_) => Language::C,
            Standard::Cpp(_) => Language::Cpp,
        }
    }

    /// The flag value (`c11`, `c++17`), if the standard carries one.
    pub fn flag_value(&self) -> Option<&'static str> {
        match self {
            Standard::Asm => None,
            Standard::C(std) => Some(std.as_flag_value()),
            Standard::Cpp(std) => Some(std.as_flag_value()),
        }
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Standard::Asm => f.write_str("ASM"),
            Standard::C(std) => std.fmt(f),
            Standard::Cpp(std) => std.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_standard_parse() {
        assert_eq!("11".parse::<CStandard>().unwrap(), CStandard::C11);
        assert_eq!("c99".parse::<CStandard>().unwrap(), CStandard::C99);
        assert_eq!("90".parse::<CStandard>().unwrap(), CStandard::C89);
        assert_eq!("18".parse::<CStandard>().unwrap(), CStandard::C17);
        assert!("42".parse::<CStandard>().is_err());
    }

    #[test]
    fn test_cpp_standard_parse() {
        assert_eq!("17".parse::<CppStandard>().unwrap(), CppStandard::Cpp17);
        assert_eq!("c++20".parse::<CppStandard>().unwrap(), CppStandard::Cpp20);
        assert!("12".parse::<CppStandard>().is_err());
    }

    #[test]
    fn test_standard_flag_values() {
        assert_eq!(Standard::C(CStandard::C11).flag_value(), Some("c11"));
        assert_eq!(Standard::Cpp(CppStandard::Cpp17).flag_value(), Some("c++17"));
        assert_eq!(Standard::Asm.flag_value(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CStandard::C89.to_string(), "C89");
        assert_eq!(CppStandard::Cpp23.to_string(), "C++23");
        assert_eq!(Standard::Asm.to_string(), "ASM");
        assert_eq!(Language::Cpp.to_string(), "C++");
    }
}

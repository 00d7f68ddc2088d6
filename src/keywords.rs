//! Closed set of VBA reserved words.
//!
//! Includes the language keywords, the built-in functions the VBE editor
//! re-cases, and the `VB_*` module attribute names. The `Line` method's
//! `B`/`BF`/`F` flags are left out: they are ordinary identifiers everywhere
//! else.

use std::collections::HashMap;
use std::sync::LazyLock;

const RESERVED_WORDS: &[&str] = &[
    "Abs", "Access", "AddressOf", "Alias", "And", "Any", "Append", "Array", "As", "Assert",
    "Attribute", "Base", "Binary", "Boolean", "ByRef", "ByVal", "Byte", "CBool",
    "CByte", "CCur", "CDate", "CDbl", "CDec", "CDecl", "CInt", "CLng", "CLngLng", "CLngPtr",
    "CSng", "CStr", "CVDate", "CVErr", "CVar", "Call", "Case", "ChDir", "Circle", "Close",
    "Compare", "Const", "CurDir", "Currency", "Database", "Date", "Debug", "Decimal", "Declare",
    "DefBool", "DefByte", "DefCur", "DefDate", "DefDbl", "DefDec", "DefInt", "DefLng",
    "DefLngLng", "DefLngPtr", "DefObj", "DefSng", "DefStr", "DefVar", "Dim", "Dir", "Do",
    "DoEvents", "Double", "Each", "Else", "ElseIf", "Empty", "End", "EndIf", "Enum", "Eqv",
    "Erase", "Error", "Event", "Exit", "Explicit", "False", "Fix", "For", "Format",
    "FreeFile", "Friend", "Function", "Get", "Global", "Go", "GoSub", "GoTo", "If", "IIf", "Imp",
    "Implements", "In", "InStr", "InStrB", "Input", "InputB", "Int", "Integer", "Is", "LBound",
    "LINEINPUT", "LSet", "Left", "Len", "LenB", "Let", "Lib", "Like", "Line", "Load", "Local",
    "Lock", "Long", "LongLong", "LongPtr", "Loop", "Me", "Mid", "MidB", "Mod", "Module",
    "MultiUse", "Name", "New", "Next", "Not", "Nothing", "Null", "Object", "On", "Open",
    "Option", "Optional", "Or", "Output", "PSet", "ParamArray", "Preserve", "Print", "Private",
    "Property", "PtrSafe", "Public", "Put", "RGB", "RSet", "RaiseEvent", "Random", "Randomize",
    "ReDim", "Read", "Rem", "Resume", "Return", "Scale", "Seek", "Select", "Set", "Sgn",
    "Shared", "Single", "Spc", "Static", "Step", "Stop", "StrComp", "String", "Sub", "Tab",
    "Text", "Then", "ThisWorkbook", "To", "True", "Type", "TypeOf", "UBound", "Unknown",
    "Unload", "Unlock", "Until", "VB_Base", "VB_Control", "VB_Creatable", "VB_Customizable",
    "VB_Description", "VB_Exposed", "VB_Ext_KEY", "VB_GlobalNameSpace", "VB_HelpID",
    "VB_Invoke_Func", "VB_Invoke_Property", "VB_Invoke_PropertyPut",
    "VB_Invoke_PropertyPutRef", "VB_MemberFlags", "VB_Name", "VB_PredeclaredId", "VB_ProcData",
    "VB_TemplateDerived", "VB_UserMemId", "VB_VarDescription", "VB_VarHelpID",
    "VB_VarMemberFlags", "VB_VarProcData", "VB_VarUserMemId", "Variant", "Wend", "While",
    "Width", "Win32", "Win64", "With", "WithEvents", "Write", "Workbook", "Xor",
];

static RESERVED: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    RESERVED_WORDS
        .iter()
        .map(|word| (word.to_ascii_lowercase(), *word))
        .collect()
});

/// Whether `word` is a reserved word, ignoring case.
#[must_use]
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains_key(&word.to_ascii_lowercase())
}

/// The editor's spelling of a reserved word, e.g. `byval` -> `ByVal`.
#[must_use]
pub fn canonical(word: &str) -> Option<&'static str> {
    RESERVED.get(&word.to_ascii_lowercase()).copied()
}

/// Every reserved word in its canonical spelling.
#[must_use]
pub const fn all() -> &'static [&'static str] {
    RESERVED_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert!(is_reserved("function"));
        assert!(is_reserved("FUNCTION"));
        assert!(is_reserved("vb_name"));
        assert!(!is_reserved("Bla"));
    }

    #[test]
    fn canonical_spelling() {
        assert_eq!(canonical("byval"), Some("ByVal"));
        assert_eq!(canonical("PTRSAFE"), Some("PtrSafe"));
        assert_eq!(canonical("notakeyword"), None);
    }

    #[test]
    fn line_flags_are_identifiers() {
        for word in ["b", "BF", "f"] {
            assert!(!is_reserved(word), "{word}");
        }
    }

    #[test]
    fn table_has_no_duplicates() {
        assert_eq!(RESERVED.len(), all().len());
    }
}

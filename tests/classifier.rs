//! Section classification of whole modules.

mod common;

use common::{ERROR_ENUMS, MISC_ASSIGN, assert_partition, kinds};
use vba_packager::SectionKind::{
    Attribute, Conditional, Declare, Enum, Function, Global, Option, Type, Unknown,
};
use vba_packager::{SectionKind, classify, classify_origin, tokenize, tokens_to_string};

const FUNCTIONS: &str = "Attribute VB_Name = \"MiscArray\"\n\
Option Explicit\n\
\n\
' Comment\n\
Private Function Bla(arr As Variant)\n\
    Bla = True\n\
End Function\n\
Private Function Bla2(arr As Variant)\n\
    Bla2 = True\n\
End Function\n\
\n";

const PTRSAFE: &str = "Attribute VB_Name = \"MiscAssign\"\n\
\n\
Option Explicit\n\
Option Private\n\
\n\
Private Declare PtrSafe Function ShellExecuteA Lib \"Shell32.dll\" _\n   (ByVal hwnd As Long, _\n   ByVal nShowCmd As Long) As Long\n\
\n";

const HASHIF: &str = "Attribute VB_Name = \"MiscAssign\"\n\
\n\
Option Explicit\n\
Option Private\n\
\n\
#If VBA7 And Win64 Then\n    Private Declare PtrSafe Function ShellExecuteA Lib \"Shell32.dll\" _\n        (ByVal hwnd As Long) As Long\n\
#Else\n\
\n    Private Declare Function ShellExecuteA Lib \"Shell32.dll\" _\n        (ByVal hwnd As Long) As Long\n\
#End If\n";

#[test]
fn classify_functions() {
    assert_eq!(
        kinds(FUNCTIONS),
        [Attribute, Option, Unknown, Function, Unknown, Function, Unknown]
    );
}

#[test]
fn classify_enum_round_trips() {
    assert_eq!(
        kinds(ERROR_ENUMS),
        [Attribute, Unknown, Option, Unknown, Enum, Unknown]
    );
    let tokens = tokenize(ERROR_ENUMS);
    let text: String = classify(&tokens).iter().map(|s| s.text()).collect();
    assert_eq!(text, ERROR_ENUMS);
}

#[test]
fn classify_ptrsafe_declare() {
    assert_eq!(
        kinds(PTRSAFE),
        [Attribute, Unknown, Option, Option, Unknown, Declare, Unknown]
    );
}

#[test]
fn classify_conditional_block_whole() {
    assert_eq!(
        kinds(HASHIF),
        [Attribute, Unknown, Option, Option, Unknown, Conditional, Unknown]
    );
    let tokens = tokenize(HASHIF);
    let sections = classify(&tokens);
    let block = &sections[5];
    assert!(block.text().starts_with("#If VBA7 And Win64 Then\n"));
    assert!(block.text().ends_with("#End If"));
    assert!(HASHIF.contains(&block.text()));
}

#[test]
fn classify_fixture_with_trailing_function() {
    assert_eq!(
        kinds(MISC_ASSIGN),
        [Attribute, Unknown, Option, Unknown, Conditional, Unknown, Function, Unknown]
    );
}

#[test]
fn classify_globals() {
    let source = "Public gCount As Long\n\
                  Private WithEvents app As Application\n\
                  Global Const VERSION = \"1.0\"\n\
                  Static cache As New Collection\n";
    assert_eq!(kinds(source), [Global, Global, Global, Global]);
}

#[test]
fn classify_type_and_friend_property() {
    let source = "Private Type Pair\n    a As Long\n    b As Long\nEnd Type\n\
                  Friend Property Get Value() As Long\nEnd Property\n";
    assert_eq!(kinds(source), [Type, Unknown, Function, Unknown]);
}

#[test]
fn classify_declaration_inside_procedure_is_absorbed() {
    let source = "Sub Setup()\n    Dim x As Long\n    Const y = 2\nEnd Sub\n";
    assert_eq!(kinds(source), [Function, Unknown]);
}

#[test]
fn classify_mismatched_closer_does_not_end_block() {
    let source = "Sub A()\nEnd Function\nEnd Sub\n";
    let sections = classify(&tokenize(source));
    assert_eq!(sections[0].kind, Function);
    assert_eq!(sections[0].text(), "Sub A()\nEnd Function\nEnd Sub");
}

#[test]
fn classify_unclosed_procedure_is_unknown() {
    assert_eq!(kinds("Sub A()\n    x = 1\n"), [Unknown]);
}

#[test]
fn classify_private_flag_from_first_tokens() {
    let sections = classify(&tokenize(FUNCTIONS));
    let flags: Vec<(SectionKind, bool)> = sections.iter().map(|s| (s.kind, s.private)).collect();
    assert!(flags.contains(&(Function, true)));
    assert!(flags.contains(&(Option, false)));
}

#[test]
fn classify_origin_tags_every_section() {
    let sections = classify_origin(&tokenize(FUNCTIONS), "file_a");
    assert!(sections.iter().all(|s| s.origin.as_deref() == Some("file_a")));
}

#[test]
fn classify_crlf_module() {
    let source = FUNCTIONS.replace('\n', "\r\n");
    assert_eq!(
        kinds(&source),
        [Attribute, Option, Unknown, Function, Unknown, Function, Unknown]
    );
    let tokens = tokenize(&source);
    let sections = classify(&tokens);
    assert_eq!(
        tokens_to_string(&sections.iter().flat_map(|s| s.tokens.clone()).collect::<Vec<_>>()),
        source
    );
}

#[test]
fn classify_partitions_fixtures() {
    for source in [FUNCTIONS, PTRSAFE, HASHIF, ERROR_ENUMS, MISC_ASSIGN] {
        assert_partition(source);
    }
}

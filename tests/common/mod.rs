#![allow(dead_code)]

use vba_packager::{SectionKind, SourceBundle, classify, tokenize, tokens_to_string};

/// Two private functions behind a comment.
pub const MISC_ARRAY: &str = r##"Attribute VB_Name = "MiscArray"

Option Explicit

' Comment
Private Function Bla(arr As Variant)
    Bla = True
End Function
Private Function Bla2(arr As Variant)
    Bla2 = True
End Function
"##;

/// A public enum, with a comment before the options.
pub const ERROR_ENUMS: &str = r##"Attribute VB_Name = "aErrorEnums"
' Comment

Option Explicit

Enum ErrNr
    Val1 = 3
    Val2 = 5
End Enum
"##;

/// A conditional pair of private declares and one private function.
pub const MISC_ASSIGN: &str = r##"Attribute VB_Name = "MiscAssign"

Option Explicit

#If VBA7 And Win64 Then
    Private Declare PtrSafe Function ShellExecuteA Lib "Shell32.dll" _
        (ByVal hwnd As Long, _
        ByVal lpOperation As String, _
        ByVal lpFile As String, _
       ByVal lpParameters As String, _
        ByVal lpDirectory As String, _
        ByVal nShowCmd As Long) As Long
#Else

    Private Declare Function ShellExecuteA Lib "Shell32.dll" _
        (ByVal hwnd As Long, _
        ByVal lpOperation As String, _
        ByVal lpFile As String, _
        ByVal lpParameters As String, _
        ByVal lpDirectory As String, _
        ByVal nShowCmd As Long) As Long
#End If

Private Function Bla3()
    Bla3 = True
End Function
"##;

/// Merge of [`MISC_ARRAY`], [`ERROR_ENUMS`] and [`MISC_ASSIGN`], in that
/// order.
pub const MERGED: &str = r##"Attribute VB_Name = "MiscArray"
Option Explicit

'*************** MiscAssign
#If VBA7 And Win64 Then
    Private Declare PtrSafe Function MiscAssign_ShellExecuteA Lib "Shell32.dll" Alias "ShellExecuteA" _
        (ByVal hwnd As Long, _
        ByVal lpOperation As String, _
        ByVal lpFile As String, _
       ByVal lpParameters As String, _
        ByVal lpDirectory As String, _
        ByVal nShowCmd As Long) As Long
#Else

    Private Declare Function MiscAssign_ShellExecuteA Lib "Shell32.dll" Alias "ShellExecuteA" _
        (ByVal hwnd As Long, _
        ByVal lpOperation As String, _
        ByVal lpFile As String, _
        ByVal lpParameters As String, _
        ByVal lpDirectory As String, _
        ByVal nShowCmd As Long) As Long
#End If

'*************** aErrorEnums
Enum ErrNr
    Val1 = 3
    Val2 = 5
End Enum

'*************** MiscArray
' Comment
Private Function MiscArray_Bla(arr As Variant)
    MiscArray_Bla = True
End Function

Private Function MiscArray_Bla2(arr As Variant)
    MiscArray_Bla2 = True
End Function

'*************** MiscAssign
Private Function MiscAssign_Bla3()
    MiscAssign_Bla3 = True
End Function

"##;

/// The three fixture modules keyed `file_a`, `file_b`, `file_c`.
pub fn fixture_bundle() -> SourceBundle {
    SourceBundle::new()
        .source("file_a", MISC_ARRAY)
        .source("file_b", ERROR_ENUMS)
        .source("file_c", MISC_ASSIGN)
}

pub fn kinds(source: &str) -> Vec<SectionKind> {
    classify(&tokenize(source)).iter().map(|s| s.kind).collect()
}

/// Assert that concatenating the tokens reproduces `input`.
pub fn assert_roundtrip(input: &str) {
    let output = tokens_to_string(&tokenize(input));
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Assert that the sections cover `input` exactly, in order.
pub fn assert_partition(input: &str) {
    let tokens = tokenize(input);
    let sections = classify(&tokens);
    let rejoined: Vec<_> = sections.iter().flat_map(|s| s.tokens.iter().cloned()).collect();
    assert_eq!(rejoined, tokens, "sections do not cover:\n{input}");
    assert!(
        sections.iter().all(|s| !s.tokens.is_empty()),
        "empty section in:\n{input}"
    );
}

//! Split a module into sections and print each one.

fn main() {
    let input = "\
Attribute VB_Name = \"Timer\"
Option Explicit

#If VBA7 Then
    Private Declare PtrSafe Sub Sleep Lib \"kernel32\" (ByVal ms As Long)
#Else
    Private Declare Sub Sleep Lib \"kernel32\" (ByVal ms As Long)
#End If

Private started As Double

Public Sub Pause(ByVal seconds As Double)
    Sleep CLng(seconds * 1000)
End Sub
";

    let tokens = vba_packager::tokenize(input);
    println!("Tokens: {}", tokens.len());

    for section in vba_packager::classify(&tokens) {
        let text = section.text();
        let first_line = text.trim().lines().next().unwrap_or_default();
        let private = if section.private { " (private)" } else { "" };
        println!("{:>9}{private}: {first_line}", section.kind.to_string());
    }
}

//! Merge two modules that both define a private helper.

use vba_packager::SourceBundle;

fn main() {
    let strings = "\
Attribute VB_Name = \"Strings\"
Option Explicit

Private Function Clean(s As String) As String
    Clean = Trim(s)
End Function

Public Function Words(s As String) As Variant
    Words = Split(Clean(s), \" \")
End Function
";

    let numbers = "\
Attribute VB_Name = \"Numbers\"
Option Explicit

Private Const LIMIT As Long = 100

Private Function Clean(x As Double) As Double
    If x > LIMIT Then x = LIMIT
    Clean = x
End Function
";

    let bundle = SourceBundle::new()
        .source("Strings.bas", strings)
        .source("Numbers.bas", numbers);

    match vba_packager::merge(bundle, Some("Toolbox")) {
        Ok(merged) => print!("{merged}"),
        Err(e) => eprintln!("merge failed: {e}"),
    }
}

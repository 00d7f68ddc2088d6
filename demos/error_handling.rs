//! Demonstrate the errors a merge can report.

use vba_packager::{MergeError, SourceBundle};

fn main() {
    // Options differ between modules
    let bundle = SourceBundle::new()
        .source("a.bas", "Attribute VB_Name = \"A\"\nOption Explicit\n")
        .source("b.bas", "Attribute VB_Name = \"B\"\nOption Explicit\nOption Base 1\n");

    match vba_packager::merge(bundle, None) {
        Ok(_) => println!("Merged OK (unexpected)"),
        Err(MergeError::OptionConflict { origin, options, .. }) => {
            println!("Option conflict in {origin}");
            for option in options {
                println!("  {option}");
            }
        }
        Err(e) => println!("Merge error: {e}"),
    }

    println!();

    // Module without a name
    let bundle = SourceBundle::new().source("nameless.bas", "Sub A()\nEnd Sub\n");

    match vba_packager::merge(bundle, None) {
        Ok(_) => println!("Merged OK (unexpected)"),
        Err(MergeError::ModuleName(e)) => {
            println!("Module name error: {e}");
            println!("  Origin: {}", e.origin);
        }
        Err(e) => println!("Merge error: {e}"),
    }
}

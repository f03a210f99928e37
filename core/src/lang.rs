//! Static MUMPS language tables: commands, intrinsic functions, special
//! variables, and structured system variables, each with its standard
//! abbreviation and a one-line description used for hover and completion.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LangEntry {
    pub name: &'static str,
    pub abbrev: &'static str,
    pub doc: &'static str,
}

/// The 1995 standard command set. HALT and HANG share the abbreviation
/// `H`; an argumentless `H` is HALT, `H` with arguments is HANG.
pub const COMMANDS: &[LangEntry] = &[
    LangEntry { name: "BREAK", abbrev: "B", doc: "Breakpoint for debugging" },
    LangEntry { name: "CLOSE", abbrev: "C", doc: "Close a device" },
    LangEntry { name: "DO", abbrev: "D", doc: "Execute a routine or subroutine" },
    LangEntry { name: "ELSE", abbrev: "E", doc: "Alternative execution path" },
    LangEntry { name: "FOR", abbrev: "F", doc: "Iteration control" },
    LangEntry { name: "GOTO", abbrev: "G", doc: "Transfer control to a label" },
    LangEntry { name: "HALT", abbrev: "H", doc: "Terminate execution" },
    LangEntry { name: "HANG", abbrev: "H", doc: "Suspend execution for specified seconds" },
    LangEntry { name: "IF", abbrev: "I", doc: "Conditional execution" },
    LangEntry { name: "JOB", abbrev: "J", doc: "Start a background process" },
    LangEntry { name: "KILL", abbrev: "K", doc: "Remove variables from memory" },
    LangEntry { name: "LOCK", abbrev: "L", doc: "Control concurrent access" },
    LangEntry { name: "MERGE", abbrev: "M", doc: "Copy data structures" },
    LangEntry { name: "NEW", abbrev: "N", doc: "Create new variable scope" },
    LangEntry { name: "OPEN", abbrev: "O", doc: "Open a device" },
    LangEntry { name: "QUIT", abbrev: "Q", doc: "Return from routine" },
    LangEntry { name: "READ", abbrev: "R", doc: "Read from device" },
    LangEntry { name: "SET", abbrev: "S", doc: "Assign values" },
    LangEntry { name: "TCOMMIT", abbrev: "TC", doc: "Commit transaction" },
    LangEntry { name: "TRESTART", abbrev: "TRE", doc: "Restart transaction" },
    LangEntry { name: "TROLLBACK", abbrev: "TRO", doc: "Rollback transaction" },
    LangEntry { name: "TSTART", abbrev: "TS", doc: "Start transaction" },
    LangEntry { name: "USE", abbrev: "U", doc: "Select device for I/O" },
    LangEntry { name: "VIEW", abbrev: "V", doc: "Implementation-specific operations" },
    LangEntry { name: "WRITE", abbrev: "W", doc: "Write to device" },
    LangEntry { name: "XECUTE", abbrev: "X", doc: "Execute string as code" },
];

pub const FUNCTIONS: &[LangEntry] = &[
    LangEntry { name: "$ASCII", abbrev: "$A", doc: "Get ASCII value of character" },
    LangEntry { name: "$CHAR", abbrev: "$C", doc: "Get character from ASCII value" },
    LangEntry { name: "$DATA", abbrev: "$D", doc: "Check if variable exists" },
    LangEntry { name: "$EXTRACT", abbrev: "$E", doc: "Extract substring" },
    LangEntry { name: "$FIND", abbrev: "$F", doc: "Find substring position" },
    LangEntry { name: "$FNUMBER", abbrev: "$FN", doc: "Format number" },
    LangEntry { name: "$GET", abbrev: "$G", doc: "Get value with default" },
    LangEntry { name: "$JUSTIFY", abbrev: "$J", doc: "Right-justify string" },
    LangEntry { name: "$LENGTH", abbrev: "$L", doc: "Get string/list length" },
    LangEntry { name: "$NAME", abbrev: "$NA", doc: "Get variable name reference" },
    LangEntry { name: "$NEXT", abbrev: "$N", doc: "Get next subscript (deprecated)" },
    LangEntry { name: "$ORDER", abbrev: "$O", doc: "Get next subscript in sequence" },
    LangEntry { name: "$PIECE", abbrev: "$P", doc: "Extract delimited piece" },
    LangEntry { name: "$QLENGTH", abbrev: "$QL", doc: "Get subscript count" },
    LangEntry { name: "$QSUBSCRIPT", abbrev: "$QS", doc: "Get specific subscript" },
    LangEntry { name: "$QUERY", abbrev: "$Q", doc: "Get next node reference" },
    LangEntry { name: "$RANDOM", abbrev: "$R", doc: "Generate random number" },
    LangEntry { name: "$REVERSE", abbrev: "$RE", doc: "Reverse string" },
    LangEntry { name: "$SELECT", abbrev: "$S", doc: "Conditional expression" },
    LangEntry { name: "$STACK", abbrev: "$ST", doc: "Get stack information" },
    LangEntry { name: "$TEXT", abbrev: "$T", doc: "Get routine source line" },
    LangEntry { name: "$TRANSLATE", abbrev: "$TR", doc: "Character translation" },
    LangEntry { name: "$VIEW", abbrev: "$V", doc: "Implementation-specific function" },
];

pub const SPECIAL_VARS: &[LangEntry] = &[
    LangEntry { name: "$DEVICE", abbrev: "$D", doc: "Device status" },
    LangEntry { name: "$ECODE", abbrev: "$EC", doc: "Error codes" },
    LangEntry { name: "$ESTACK", abbrev: "$ES", doc: "Error stack level" },
    LangEntry { name: "$ETRAP", abbrev: "$ET", doc: "Error trap" },
    LangEntry { name: "$HOROLOG", abbrev: "$H", doc: "Date/time since Dec 31, 1840" },
    LangEntry { name: "$IO", abbrev: "$I", doc: "Current I/O device" },
    LangEntry { name: "$JOB", abbrev: "$J", doc: "Process identifier" },
    LangEntry { name: "$KEY", abbrev: "$K", doc: "Terminator from last READ" },
    LangEntry { name: "$PRINCIPAL", abbrev: "$P", doc: "Principal device" },
    LangEntry { name: "$QUIT", abbrev: "$Q", doc: "Quit context flag" },
    LangEntry { name: "$REFERENCE", abbrev: "$R", doc: "Last global reference" },
    LangEntry { name: "$STACK", abbrev: "$ST", doc: "Stack level" },
    LangEntry { name: "$STORAGE", abbrev: "$S", doc: "Available storage" },
    LangEntry { name: "$SYSTEM", abbrev: "$SY", doc: "System identifier" },
    LangEntry { name: "$TEST", abbrev: "$T", doc: "Result of last IF" },
    LangEntry { name: "$TLEVEL", abbrev: "$TL", doc: "Transaction level" },
    LangEntry { name: "$TRESTART", abbrev: "$TR", doc: "Transaction restart count" },
    LangEntry { name: "$X", abbrev: "$X", doc: "Horizontal cursor position" },
    LangEntry { name: "$Y", abbrev: "$Y", doc: "Vertical cursor position" },
];

pub const SSVNS: &[LangEntry] = &[
    LangEntry { name: "^$CHARACTER", abbrev: "^$C", doc: "Character set information" },
    LangEntry { name: "^$DEVICE", abbrev: "^$D", doc: "Device information" },
    LangEntry { name: "^$GLOBAL", abbrev: "^$G", doc: "Global directory" },
    LangEntry { name: "^$JOB", abbrev: "^$J", doc: "Job information" },
    LangEntry { name: "^$LOCK", abbrev: "^$L", doc: "Lock information" },
    LangEntry { name: "^$ROUTINE", abbrev: "^$R", doc: "Routine information" },
    LangEntry { name: "^$SYSTEM", abbrev: "^$S", doc: "System information" },
];

fn build_lookup(entries: &'static [LangEntry]) -> FxHashMap<&'static str, &'static LangEntry> {
    let mut map = FxHashMap::default();
    for e in entries {
        map.insert(e.name, e);
        // First writer wins so HALT keeps `H` and HANG is resolved by
        // argument shape in canonical_command.
        map.entry(e.abbrev).or_insert(e);
    }
    map
}

static COMMAND_LOOKUP: Lazy<FxHashMap<&'static str, &'static LangEntry>> = Lazy::new(|| build_lookup(COMMANDS));
static FUNCTION_LOOKUP: Lazy<FxHashMap<&'static str, &'static LangEntry>> = Lazy::new(|| build_lookup(FUNCTIONS));
static SPECIAL_VAR_LOOKUP: Lazy<FxHashMap<&'static str, &'static LangEntry>> =
    Lazy::new(|| build_lookup(SPECIAL_VARS));
static SSVN_LOOKUP: Lazy<FxHashMap<&'static str, &'static LangEntry>> = Lazy::new(|| build_lookup(SSVNS));

/// Look up a word as a command, by full name or abbreviation,
/// case-insensitively.
pub fn lookup_command(word: &str) -> Option<&'static LangEntry> {
    COMMAND_LOOKUP.get(word.to_ascii_uppercase().as_str()).copied()
}

/// Resolve a command word to its canonical entry. The one genuinely
/// context-dependent abbreviation is `H`: HALT when argumentless, HANG
/// otherwise.
pub fn canonical_command(word: &str, argumentless: bool) -> Option<&'static LangEntry> {
    let upper = word.to_ascii_uppercase();
    if upper == "H" {
        let name = if argumentless { "HALT" } else { "HANG" };
        return COMMAND_LOOKUP.get(name).copied();
    }
    COMMAND_LOOKUP.get(upper.as_str()).copied()
}

/// Look up `$NAME(` intrinsic-function text (sigil included).
pub fn lookup_function(text: &str) -> Option<&'static LangEntry> {
    FUNCTION_LOOKUP.get(text.to_ascii_uppercase().as_str()).copied()
}

/// Look up `$NAME` special-variable text (sigil included).
pub fn lookup_special_var(text: &str) -> Option<&'static LangEntry> {
    SPECIAL_VAR_LOOKUP.get(text.to_ascii_uppercase().as_str()).copied()
}

/// Look up `^$NAME` structured-system-variable text (sigil included).
pub fn lookup_ssvn(text: &str) -> Option<&'static LangEntry> {
    SSVN_LOOKUP.get(text.to_ascii_uppercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lookup_covers_full_names_and_abbrevs() {
        assert_eq!(lookup_command("SET").unwrap().name, "SET");
        assert_eq!(lookup_command("s").unwrap().name, "SET");
        assert_eq!(lookup_command("TRO").unwrap().name, "TROLLBACK");
        assert!(lookup_command("FROB").is_none());
    }

    #[test]
    fn halt_vs_hang_resolved_by_argument_shape() {
        assert_eq!(canonical_command("H", true).unwrap().name, "HALT");
        assert_eq!(canonical_command("H", false).unwrap().name, "HANG");
        assert_eq!(canonical_command("HANG", true).unwrap().name, "HANG");
    }

    #[test]
    fn function_and_special_var_tables_disambiguate_by_caller() {
        assert_eq!(lookup_function("$P").unwrap().name, "$PIECE");
        assert_eq!(lookup_special_var("$P").unwrap().name, "$PRINCIPAL");
        assert_eq!(lookup_function("$piece").unwrap().name, "$PIECE");
        assert_eq!(lookup_ssvn("^$G").unwrap().name, "^$GLOBAL");
    }
}

//! Keyword table and library dispatch
//!
//! Every keyword is a [`KeywordDef`] in the static [`KEYWORDS`] table.
//! [`ExcelLibrary`] looks keywords up by name, checks arity, coerces the
//! string arguments and runs the handler against its [`Session`].
//!
//! Names match the way keyword-driven hosts match them: case is ignored, and
//! so are spaces and underscores. `Open Excel`, `open_excel` and `openExcel`
//! are the same keyword.

use std::fmt;

use crate::args::{parse_bool, parse_flag, parse_index, parse_number};
use crate::error::{Error, Result};
use crate::session::{Session, SessionOptions};

/// Value a keyword hands back to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordValue {
    None,
    String(String),
    List(Vec<String>),
}

impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordValue::None => Ok(()),
            KeywordValue::String(s) => f.write_str(s),
            KeywordValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}'", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Keyword implementation over already arity-checked arguments
pub type KeywordHandler = fn(&mut Session, &[&str]) -> Result<KeywordValue>;

/// One entry of the keyword table
pub struct KeywordDef {
    pub name: &'static str,
    /// Argument names, in call order
    pub args: &'static [&'static str],
    pub doc: &'static str,
    pub handler: KeywordHandler,
}

impl fmt::Debug for KeywordDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDef")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

const LIBRARY_DOCUMENTATION: &str = "\
Keysheet is a keyword library for reading and writing spreadsheets.

Both the legacy binary .xls format and the zip-based .xlsx format are
supported. A workbook is opened or created first, then cells of the selected
sheet are read and written by zero-based row and column numbers. Changes stay
in memory until `Save Excel` writes the whole workbook back to its file.

Cell values are exchanged as text: numbers use the cell's display format,
formulas show their computed result and booleans read `true` or `false`.
";

/// All keywords, in documentation order
pub static KEYWORDS: &[KeywordDef] = &[
    KeywordDef {
        name: "openExcel",
        args: &["excelFilePath"],
        doc: "Opens the workbook at the given path and selects its first sheet.\n\n\
              Example:\n\
              | Open Excel | /data/demo.xlsx |\n",
        handler: open_excel,
    },
    KeywordDef {
        name: "createWorkBook",
        args: &["excelFilePath"],
        doc: "Creates a workbook with one sheet named Sheet1 and writes it to the given path.\n\
              The extension, .xlsx or .xls, picks the format.\n\n\
              Example:\n\
              | Create Workbook | /data/demo.xlsx |\n\
              | Create Workbook | /data/demo.xls |\n",
        handler: create_workbook,
    },
    KeywordDef {
        name: "selectSheet",
        args: &["sheetName"],
        doc: "Selects the sheet with the given name.\n\n\
              Example:\n\
              | Select Sheet | Demo |\n",
        handler: select_sheet,
    },
    KeywordDef {
        name: "addNewSheet",
        args: &["name"],
        doc: "Adds an empty sheet to the open workbook.\n\n\
              Example:\n\
              | Add New Sheet | Sheet2 |\n",
        handler: add_new_sheet,
    },
    KeywordDef {
        name: "removeSheet",
        args: &["sheetName"],
        doc: "Removes the sheet with the given name. Removing the selected sheet leaves no sheet selected.\n\n\
              Example:\n\
              | Remove Sheet | TC_2 |\n",
        handler: remove_sheet,
    },
    KeywordDef {
        name: "getCellData",
        args: &["rowNumber", "colNumber"],
        doc: "Returns the displayed text of a cell in the selected sheet.\n\
              Formula cells return their computed value.\n\n\
              Example:\n\
              | ${value} | Get Cell Data | 1 | 2 |\n",
        handler: get_cell_data,
    },
    KeywordDef {
        name: "setCellValueWithNumber",
        args: &["number", "rowNumber", "columnNumber"],
        doc: "Sets a cell of the selected sheet to a number.\n\n\
              Example:\n\
              | Set Cell Value With Number | 34 | 1 | 2 |\n\
              | Set Cell Value With Number | 34.59 | 1 | 2 |\n",
        handler: set_number,
    },
    KeywordDef {
        name: "setCellValueWithString",
        args: &["string", "rowNumber", "columnNumber"],
        doc: "Sets a cell of the selected sheet to a string.\n\n\
              Example:\n\
              | Set Cell Value With String | dummy | 1 | 2 |\n",
        handler: set_string,
    },
    KeywordDef {
        name: "setCellValueWithBoolean",
        args: &["booleanValue", "rowNumber", "columnNumber"],
        doc: "Sets a cell of the selected sheet to true or false.\n\n\
              Example:\n\
              | Set Cell Value With Boolean | true | 1 | 2 |\n",
        handler: set_boolean,
    },
    KeywordDef {
        name: "setCellValueWithFormula",
        args: &["formula", "rowNumber", "columnNumber"],
        doc: "Sets a cell of the selected sheet to a formula. The leading = is optional.\n\n\
              Example:\n\
              | Set Cell Value With Formula | SUM(F1,G1) | 1 | 2 |\n",
        handler: set_formula,
    },
    KeywordDef {
        name: "setCellValueWithDate",
        args: &["dateValue", "rowNumber", "columnNumber"],
        doc: "Sets a cell of the selected sheet to a date given as MM-dd-yyyy.\n\
              The cell is shown in mm-dd-yyyy form.\n\n\
              Example:\n\
              | Set Cell Value With Date | 03-30-2018 | 1 | 2 |\n",
        handler: set_date,
    },
    KeywordDef {
        name: "removeCellValue",
        args: &["rowNumber", "columnNumber"],
        doc: "Clears the value of a cell in the selected sheet.\n\n\
              Example:\n\
              | Remove Cell Value | 1 | 2 |\n",
        handler: remove_cell_value,
    },
    KeywordDef {
        name: "getRowCount",
        args: &[],
        doc: "Returns the index of the last row of the selected sheet plus one.\n\n\
              Example:\n\
              | ${rowCount} | Get Row Count |\n\
              | Should Be Equal As Integers | 2 | ${rowCount} |\n",
        handler: get_row_count,
    },
    KeywordDef {
        name: "getColumnCount",
        args: &[],
        doc: "Returns the index of the last cell of the first row plus one.\n\n\
              Example:\n\
              | ${colCount} | Get Column Count |\n\
              | Should Be Equal As Integers | 2 | ${colCount} |\n",
        handler: get_column_count,
    },
    KeywordDef {
        name: "getNumberOfSheets",
        args: &[],
        doc: "Returns the number of sheets in the open workbook.\n\n\
              Example:\n\
              | ${result} | Get Number Of Sheets |\n\
              | Should Be Equal As Integers | 2 | ${result} |\n",
        handler: get_number_of_sheets,
    },
    KeywordDef {
        name: "getSheetNames",
        args: &[],
        doc: "Returns the sheet names of the open workbook in order.\n\n\
              Example:\n\
              | ${result} | Get Sheet Names |\n\
              | Should Be Equal As Strings | TC_1 | ${result[1]} |\n",
        handler: get_sheet_names,
    },
    KeywordDef {
        name: "getRowValues",
        args: &["rowNumber", "includeEmptyCells"],
        doc: "Returns the values of a row of the selected sheet, one per column.\n\
              Empty cells are dropped unless includeEmptyCells is true.\n\n\
              Example:\n\
              | ${result} | Get Row Values | 2 | True |\n\
              | Should Be Equal As Strings | Demo | ${result[0]} |\n",
        handler: get_row_values,
    },
    KeywordDef {
        name: "getColumnValues",
        args: &["colNumber", "includeEmptyCells"],
        doc: "Returns the values of a column of the selected sheet, one per row.\n\
              Empty cells are dropped unless includeEmptyCells is true.\n\n\
              Example:\n\
              | ${result} | Get Column Values | 2 | True |\n\
              | Should Be Equal As Strings | Demo | ${result[0]} |\n",
        handler: get_column_values,
    },
    KeywordDef {
        name: "saveExcel",
        args: &[],
        doc: "Writes the whole workbook back to the file it was opened from or created at.\n\n\
              Example:\n\
              | Remove Cell Value | 1 | 2 |\n\
              | Save Excel |\n",
        handler: save_excel,
    },
];

/// Lookup key for a keyword name: lowercase without spaces or underscores
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Keyword for a name in any of the spellings hosts use
pub fn find_keyword(name: &str) -> Option<&'static KeywordDef> {
    let key = normalize_name(name);
    KEYWORDS.iter().find(|k| normalize_name(k.name) == key)
}

// ===== Handlers =====

fn done(result: Result<()>) -> Result<KeywordValue> {
    result.map(|()| KeywordValue::None)
}

fn open_excel(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    done(session.open(args[0]))
}

fn create_workbook(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    done(session.create(args[0]))
}

fn select_sheet(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    done(session.select_sheet(args[0]))
}

fn add_new_sheet(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    done(session.add_sheet(args[0]))
}

fn remove_sheet(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    done(session.remove_sheet(args[0]))
}

fn get_cell_data(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let row = parse_index("rowNumber", args[0])?;
    let col = parse_index("colNumber", args[1])?;
    session.get_cell(row, col).map(KeywordValue::String)
}

/// Row and column of the setter keywords, which take the value first
fn target(args: &[&str]) -> Result<(u32, u32)> {
    Ok((
        parse_index("rowNumber", args[1])?,
        parse_index("columnNumber", args[2])?,
    ))
}

fn set_number(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let value = parse_number(args[0])?;
    let (row, col) = target(args)?;
    done(session.set_cell_number(value, row, col))
}

fn set_string(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let (row, col) = target(args)?;
    done(session.set_cell_string(args[0], row, col))
}

fn set_boolean(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let value = parse_bool(args[0])?;
    let (row, col) = target(args)?;
    done(session.set_cell_boolean(value, row, col))
}

fn set_formula(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let (row, col) = target(args)?;
    done(session.set_cell_formula(args[0], row, col))
}

fn set_date(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let (row, col) = target(args)?;
    done(session.set_cell_date(args[0], row, col))
}

fn remove_cell_value(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let row = parse_index("rowNumber", args[0])?;
    let col = parse_index("columnNumber", args[1])?;
    done(session.remove_cell_value(row, col))
}

fn get_row_count(session: &mut Session, _args: &[&str]) -> Result<KeywordValue> {
    Ok(KeywordValue::String(session.row_count()?.to_string()))
}

fn get_column_count(session: &mut Session, _args: &[&str]) -> Result<KeywordValue> {
    Ok(KeywordValue::String(session.column_count()?.to_string()))
}

fn get_number_of_sheets(session: &mut Session, _args: &[&str]) -> Result<KeywordValue> {
    Ok(KeywordValue::String(session.sheet_count()?.to_string()))
}

fn get_sheet_names(session: &mut Session, _args: &[&str]) -> Result<KeywordValue> {
    session.sheet_names().map(KeywordValue::List)
}

fn get_row_values(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let row = parse_index("rowNumber", args[0])?;
    session
        .row_values(row, parse_flag(args[1]))
        .map(KeywordValue::List)
}

fn get_column_values(session: &mut Session, args: &[&str]) -> Result<KeywordValue> {
    let col = parse_index("colNumber", args[0])?;
    session
        .column_values(col, parse_flag(args[1]))
        .map(KeywordValue::List)
}

fn save_excel(session: &mut Session, _args: &[&str]) -> Result<KeywordValue> {
    done(session.save())
}

// ===== Library =====

/// Keyword library facade over one [`Session`]
#[derive(Debug, Default)]
pub struct ExcelLibrary {
    session: Session,
}

impl ExcelLibrary {
    /// Documentation name that returns the library introduction
    pub const INTRO: &'static str = "__intro__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            session: Session::with_options(options),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Run a keyword with string arguments
    pub fn run_keyword<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Result<KeywordValue> {
        let keyword = lookup(name)?;
        if args.len() != keyword.args.len() {
            return Err(Error::ArgumentCount {
                keyword: keyword.name,
                expected: keyword.args.len(),
                actual: args.len(),
            });
        }
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        log::debug!("running {} {:?}", keyword.name, args);
        (keyword.handler)(&mut self.session, &args)
    }

    pub fn keyword_names(&self) -> Vec<&'static str> {
        KEYWORDS.iter().map(|k| k.name).collect()
    }

    pub fn keyword_arguments(&self, name: &str) -> Result<&'static [&'static str]> {
        Ok(lookup(name)?.args)
    }

    /// Documentation of a keyword, or of the library for [`Self::INTRO`]
    pub fn keyword_documentation(&self, name: &str) -> Result<&'static str> {
        if name == Self::INTRO {
            return Ok(LIBRARY_DOCUMENTATION);
        }
        Ok(lookup(name)?.doc)
    }
}

fn lookup(name: &str) -> Result<&'static KeywordDef> {
    find_keyword(name).ok_or_else(|| Error::UnknownKeyword(name.to_string()))
}

//! File categorization by extension.
//!
//! A [`CategoryTable`] is an ordered list of categories, each owning a set of
//! lowercase extensions (with their leading dot). Lookups walk the table in
//! order and the first category listing the extension wins, so an extension
//! that appears under several categories still resolves to exactly one.
//! Anything unmatched falls back to [`Category::others`].
//!
//! # Examples
//!
//! ```
//! use filesorter::file_category::CategoryTable;
//!
//! let table = CategoryTable::default();
//! assert_eq!(table.categorize("report.PDF").name(), "Documents");
//! assert_eq!(table.categorize("holiday.jpg").name(), "Images");
//! assert_eq!(table.categorize("notes.xyz").name(), "Others");
//! ```
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Name of the fallback category.
pub const OTHERS: &str = "Others";

/// Built-in category table. Order matters: the first category listing an
/// extension claims it.
const DEFAULT_TABLE: &[(&str, &[&str])] = &[
    (
        "Documents",
        &[
            ".pdf", ".docx", ".doc", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
            ".csv", ".md", ".markdown", ".tex", ".log", ".pages", ".numbers", ".key", ".odp",
            ".ods", ".epub", ".djvu", ".mobi", ".azw", ".azw3", ".fb2", ".oxps", ".xps",
        ],
    ),
    (
        "Images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".tiff", ".webp", ".ico", ".psd",
            ".ai", ".eps", ".indd", ".raw", ".cr2", ".nef", ".orf", ".sr2", ".heif", ".heic",
            ".xcf", ".cdr",
        ],
    ),
    (
        "Videos",
        &[
            ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg",
            ".3gp", ".3g2", ".ogv", ".vob", ".swf", ".m2ts", ".mts", ".ts", ".divx", ".f4v", ".rm",
            ".rmvb", ".ogm",
        ],
    ),
    (
        "Audio",
        &[
            ".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma", ".opus", ".aiff", ".alac",
            ".ape", ".mid", ".midi", ".amr", ".ac3", ".dts", ".ra", ".voc", ".pcm", ".dsf", ".dff",
            ".mka", ".au",
        ],
    ),
    (
        "Archives",
        &[
            ".zip", ".rar", ".tar", ".gz", ".7z", ".bz2", ".xz", ".iso", ".tgz", ".tbz2", ".txz",
            ".cab", ".deb", ".rpm", ".pkg", ".dmg", ".z", ".lzma", ".lz", ".lz4", ".lzo", ".zst",
            ".arj",
        ],
    ),
    (
        "Code",
        &[
            ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".h", ".php", ".rb", ".go",
            ".rs", ".ts", ".swift", ".kt", ".kts", ".scala", ".sc", ".dart", ".lua", ".pl", ".pm",
            ".sh", ".bash", ".ps1", ".bat", ".cmd", ".sql", ".r", ".jsx", ".tsx", ".vue", ".elm",
            ".clj", ".ex", ".exs", ".erl", ".hrl", ".hs", ".lhs", ".fs", ".fsx", ".ml", ".mli",
            ".groovy", ".cs", ".vb", ".xaml", ".xml", ".json", ".yaml", ".yml", ".toml", ".ini",
            ".config", ".cmake", ".make", ".gradle", ".m", ".mm", ".f", ".f90", ".f95", ".f03",
            ".f08", ".asm", ".s", ".gitignore", ".dockerignore", ".editorconfig",
        ],
    ),
    (
        "Executables",
        &[
            ".exe", ".msi", ".app", ".dmg", ".deb", ".rpm", ".apk", ".jar", ".war", ".dll", ".so",
            ".dylib", ".bin", ".run", ".bat", ".cmd", ".com", ".gadget", ".vb", ".vbs", ".ps1",
            ".msc",
        ],
    ),
    (
        "Fonts",
        &[
            ".ttf", ".otf", ".woff", ".woff2", ".eot", ".fnt", ".fon", ".bdf", ".pfb", ".pfm",
            ".afm", ".pfa",
        ],
    ),
    (
        "Spreadsheets",
        &[
            ".xlsx", ".xls", ".xlsm", ".xlsb", ".numbers", ".ods", ".csv", ".tsv", ".dif",
            ".sylk", ".dbf",
        ],
    ),
    (
        "Presentations",
        &[".pptx", ".ppt", ".pps", ".ppsx", ".odp", ".key", ".gslides"],
    ),
    (
        "Databases",
        &[
            ".db", ".sqlite", ".sqlite3", ".mdb", ".accdb", ".sql", ".bak", ".dbf", ".frm", ".ibd",
            ".myd", ".myi",
        ],
    ),
    (
        "3D_Models",
        &[
            ".obj", ".fbx", ".3ds", ".stl", ".dae", ".blend", ".max", ".ma", ".mb", ".c4d", ".lwo",
            ".lws",
        ],
    ),
    (
        "CAD",
        &[
            ".dwg", ".dxf", ".step", ".stp", ".iges", ".igs", ".x_t", ".x_b", ".sldprt", ".sldasm",
            ".ipt", ".iam",
        ],
    ),
    (
        "Vector",
        &[".svg", ".ai", ".eps", ".pdf", ".cdr", ".afdesign", ".sketch"],
    ),
    (
        "Ebooks",
        &[
            ".epub", ".mobi", ".azw", ".azw3", ".fb2", ".ibooks", ".cbr", ".cbz", ".pdf",
        ],
    ),
];

/// A named bucket of file extensions.
///
/// The name doubles as the folder name files of this category are moved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Creates a category with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The fallback category for unmatched extensions.
    ///
    /// ```
    /// use filesorter::file_category::Category;
    ///
    /// assert_eq!(Category::others().name(), "Others");
    /// assert!(Category::others().is_others());
    /// ```
    pub fn others() -> Self {
        Self(OTHERS.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the directory name for this category.
    pub fn dir_name(&self) -> &str {
        &self.0
    }

    pub fn is_others(&self) -> bool {
        self.0 == OTHERS
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a [`CategoryTable`].
#[derive(Debug, Clone)]
pub struct CategoryRule {
    category: Category,
    extensions: HashSet<String>,
}

impl CategoryRule {
    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}

/// Ordered extension-to-category table.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    fallback: Category,
}

impl CategoryTable {
    /// Creates an empty table: every file categorizes as "Others".
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Category::others(),
        }
    }

    /// Appends a category after the existing ones.
    ///
    /// Extensions are stored lowercase. Appending a category that is already
    /// present merges the extensions into the existing row without changing
    /// its position.
    pub fn add_category<I, S>(&mut self, name: &str, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().to_lowercase());

        if let Some(rule) = self.rules.iter_mut().find(|r| r.category.name() == name) {
            rule.extensions.extend(extensions);
        } else {
            self.rules.push(CategoryRule {
                category: Category::new(name),
                extensions: extensions.collect(),
            });
        }
        self
    }

    /// Maps an extension (with its leading dot) to the first category that
    /// lists it.
    ///
    /// ```
    /// use filesorter::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.extension_to_category(".MP3").map(|c| c.name()), Some("Audio"));
    /// assert_eq!(table.extension_to_category(".nope"), None);
    /// ```
    pub fn extension_to_category(&self, extension: &str) -> Option<&Category> {
        let extension = extension.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.contains(&extension))
            .map(|rule| &rule.category)
    }

    /// Determines the category of a file from its name alone.
    ///
    /// Only the final suffix is significant and it is compared
    /// case-insensitively. Names without a suffix go to "Others".
    pub fn categorize(&self, file_name: &str) -> Category {
        split_extension(file_name)
            .1
            .and_then(|ext| self.extension_to_category(ext))
            .unwrap_or(&self.fallback)
            .clone()
    }

    /// Table rows in priority order. The fallback is not included.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Every category in table order, ending with the fallback.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.rules
            .iter()
            .map(|rule| &rule.category)
            .filter(|category| !category.is_others())
            .chain(std::iter::once(&self.fallback))
    }

    /// Position of a category in table order; unknown categories sort last.
    pub fn rank(&self, category: &Category) -> usize {
        self.categories()
            .position(|c| c == category)
            .unwrap_or(usize::MAX)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, extensions) in DEFAULT_TABLE {
            table.add_category(name, extensions.iter());
        }
        table
    }
}

/// Splits a file name into stem and final suffix (including the dot).
///
/// A leading dot does not start a suffix and neither does a trailing one,
/// so `.bashrc` and `notes.` have no extension.
///
/// ```
/// use filesorter::file_category::split_extension;
///
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some(".gz")));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", None));
/// assert_eq!(split_extension("README"), ("README", None));
/// ```
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx < file_name.len() - 1 => {
            (&file_name[..idx], Some(&file_name[idx..]))
        }
        _ => (file_name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_table_order() {
        let table = CategoryTable::default();
        let names: Vec<_> = table.categories().map(|c| c.name().to_string()).collect();
        assert_eq!(names.first().map(String::as_str), Some("Documents"));
        assert_eq!(names.last().map(String::as_str), Some(OTHERS));
        assert_eq!(names.len(), DEFAULT_TABLE.len() + 1);
    }

    #[test]
    fn test_categorize_common_types() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize("a.pdf").name(), "Documents");
        assert_eq!(table.categorize("b.jpg").name(), "Images");
        assert_eq!(table.categorize("c.mp3").name(), "Audio");
        assert_eq!(table.categorize("d.mkv").name(), "Videos");
        assert_eq!(table.categorize("e.zip").name(), "Archives");
        assert_eq!(table.categorize("f.rs").name(), "Code");
        assert_eq!(table.categorize("g.exe").name(), "Executables");
        assert_eq!(table.categorize("h.woff2").name(), "Fonts");
        assert_eq!(table.categorize("i.sqlite").name(), "Databases");
        assert_eq!(table.categorize("j.stl").name(), "3D_Models");
        assert_eq!(table.categorize("k.dwg").name(), "CAD");
        assert_eq!(table.categorize("l.sketch").name(), "Vector");
        assert_eq!(table.categorize("m.cbz").name(), "Ebooks");
    }

    #[test]
    fn test_categorize_case_insensitive() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize("x.PDF"), table.categorize("x.pdf"));
        assert_eq!(table.categorize("Photo.JpEg").name(), "Images");
    }

    #[test]
    fn test_first_match_wins_for_shared_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize("sheet.xlsx").name(), "Documents");
        assert_eq!(table.categorize("clip.ts").name(), "Videos");
        assert_eq!(table.categorize("logo.svg").name(), "Images");
        assert_eq!(table.categorize("book.epub").name(), "Documents");
        assert_eq!(table.categorize("setup.deb").name(), "Archives");
        assert_eq!(table.categorize("run.bat").name(), "Code");
        assert_eq!(table.categorize("dump.sql").name(), "Code");
    }

    #[test]
    fn test_unique_extensions_map_to_their_category() {
        let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, extensions) in DEFAULT_TABLE {
            for ext in *extensions {
                owners.entry(*ext).or_default().push(*name);
            }
        }

        let table = CategoryTable::default();
        for (ext, categories) in owners.iter().filter(|(_, c)| c.len() == 1) {
            let lower = format!("x{}", ext);
            let upper = format!("x{}", ext.to_uppercase());
            assert_eq!(table.categorize(&lower).name(), categories[0], "{}", ext);
            assert_eq!(table.categorize(&upper).name(), categories[0], "{}", ext);
        }
    }

    #[test]
    fn test_unrecognized_names_fall_back_to_others() {
        let table = CategoryTable::default();
        for name in ["d.xyz", "README", ".bashrc", "trailing.", "no_ext", "a.b.unknown"] {
            assert!(table.categorize(name).is_others(), "{}", name);
        }
    }

    #[test]
    fn test_tool_config_suffixes_are_code() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize("x.gitignore").name(), "Code");
        assert_eq!(table.categorize("web.dockerignore").name(), "Code");
        assert_eq!(table.categorize("repo.EditorConfig").name(), "Code");
        // A bare dotfile has no suffix.
        assert!(table.categorize(".gitignore").is_others());
    }

    #[test]
    fn test_only_final_suffix_counts() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize("backup.pdf.zip").name(), "Archives");
        assert_eq!(table.categorize("archive.tar.gz").name(), "Archives");
        assert!(table.categorize("report.pdf.part").is_others());
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.pdf"), ("report", Some(".pdf")));
        assert_eq!(split_extension("a.b.c"), ("a.b", Some(".c")));
        assert_eq!(split_extension("..hidden"), (".", Some(".hidden")));
        assert_eq!(split_extension("name."), ("name.", None));
        assert_eq!(split_extension(""), ("", None));
    }

    #[test]
    fn test_custom_table() {
        let mut table = CategoryTable::empty();
        table
            .add_category("Photos", [".JPG", ".png"])
            .add_category("Notes", [".txt"])
            .add_category("Photos", [".heic"]);

        assert_eq!(table.categorize("a.jpg").name(), "Photos");
        assert_eq!(table.categorize("b.heic").name(), "Photos");
        assert_eq!(table.categorize("c.txt").name(), "Notes");
        assert!(table.categorize("d.pdf").is_others());
        assert_eq!(table.rules().len(), 2);
        assert_eq!(table.rank(&Category::new("Notes")), 1);
        assert_eq!(table.rank(&Category::others()), 2);
    }

    #[test]
    fn test_category_display_and_dir_name() {
        let category = Category::new("3D_Models");
        assert_eq!(category.to_string(), "3D_Models");
        assert_eq!(category.dir_name(), "3D_Models");
        assert!(!category.is_others());
    }
}

mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)] derive macro
// ============================================================================

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[serde(rename_all = "camelCase")]
/// struct Lesson {
///     #[record(id)]
///     pub id: u64,
///     #[record(category)]
///     pub kind: LessonKind,
///     pub title: String,
/// }
///
/// let patch = LessonChanges { title: Some("Intro".into()), ..Default::default() };
/// let updated = lesson.apply(&patch);
/// ```
///
/// - `#[record(id)]` marks the `u64` identifier. Defaults to a field named `id`.
/// - `#[record(category)]` marks the tag used by category filters. Defaults to a field
///   named `category`.
/// - `#[record(changes = "...")]` on the struct names the generated partial-update type.
///   If omitted, it is the struct name + `Changes`.
///
/// Every field except the id becomes an `Option` in the changes struct, which serializes
/// only the fields that are set and mirrors the record's `rename_all`/`rename` attributes.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}

/// True unless the title contains one of the ignored words.
///
/// `ignored_words` are expected to be lower-cased and trimmed already
/// (see [`crate::app::parse_list`]).
pub fn is_allowed(title: &str, ignored_words: &[String]) -> bool {
    let title = title.to_lowercase();
    !ignored_words.iter().any(|word| title.contains(word.as_str()))
}

/// Author allow-list; an empty list lets everyone through.
pub fn author_allowed(login: &str, usernames: &[String]) -> bool {
    usernames.is_empty() || usernames.contains(&login.to_lowercase())
}

/// Repository allow-list; an empty list lets every repository through.
pub fn repository_allowed(name: &str, repositories: &[String]) -> bool {
    repositories.is_empty() || repositories.contains(&name.to_lowercase())
}

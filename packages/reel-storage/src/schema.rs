pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_sessions.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_sessions.sql")),
				"tables/002_queries.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_queries.sql")),
				"tables/003_messages.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_messages.sql")),
				"tables/004_keyframes.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_keyframes.sql")),
				"tables/005_query_results.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_query_results.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

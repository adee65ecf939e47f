mod load;
mod schema_rules;

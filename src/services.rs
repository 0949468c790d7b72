pub mod auth;
pub mod catalog_service;
pub mod employee_service;
pub mod organization_service;
pub mod rbac_service;
pub mod user_service;

use std::collections::HashMap;

// Agrupa linhas de JOIN pelo dono (ex.: permissões por cargo), já convertidas
pub(crate) fn group_by<R, T>(rows: Vec<R>, owner: impl Fn(&R) -> i64) -> HashMap<i64, Vec<T>>
where
    T: From<R>,
{
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(owner(&row)).or_default().push(T::from(row));
    }
    grouped
}


#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        owner: i64,
        value: &'static str,
    }

    impl From<Row> for String {
        fn from(row: Row) -> Self {
            row.value.to_string()
        }
    }

    #[test]
    fn rows_are_grouped_in_order() {
        let rows = vec![
            Row { owner: 1, value: "a" },
            Row { owner: 2, value: "b" },
            Row { owner: 1, value: "c" },
        ];
        let grouped: HashMap<i64, Vec<String>> = group_by(rows, |r| r.owner);
        assert_eq!(grouped[&1], vec!["a", "c"]);
        assert_eq!(grouped[&2], vec!["b"]);
    }
}

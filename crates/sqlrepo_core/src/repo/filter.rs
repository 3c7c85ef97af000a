//! Standing equality/membership restriction for one repository.

use crate::model::{declares_column, Model};
use crate::repo::sql::Conditions;
use log::debug;

/// Conditions limited to columns the bound model actually declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Conditions,
}

impl Filter {
    /// Keeps only columns declared by `M`; the rest are dropped without error.
    pub fn for_model<M: Model>(mut conditions: Conditions) -> Self {
        conditions.retain(|column| {
            let known = declares_column::<M>(column);
            if !known {
                debug!(
                    "event=filter_key_dropped module=repo status=ok model={} column={}",
                    std::any::type_name::<M>(),
                    column
                );
            }
            known
        });
        Self { conditions }
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::model::{Field, Model};
    use crate::repo::sql::{Conditions, Criterion};

    #[derive(Debug, Default)]
    struct Ticket {
        id: Option<i64>,
        queue: String,
    }

    impl Model for Ticket {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("id", |t| t.id.into(), |t, v| {
                    t.id = v.into_opt_i64()?;
                    Ok(())
                }),
                Field::<Self>::new("queue", |t| t.queue.as_str().into(), |t, v| {
                    t.queue = v.into_string()?;
                    Ok(())
                }),
            ]
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
    }

    #[test]
    fn drops_columns_the_model_does_not_declare() {
        let filter = Filter::for_model::<Ticket>(
            Conditions::new()
                .with("queue", vec!["ops", "dev"])
                .with("priority", 3_i64),
        );
        assert_eq!(filter.conditions().len(), 1);
        assert_eq!(
            filter.conditions().get("queue"),
            Some(&Criterion::any_of(["ops", "dev"]))
        );
    }

    #[test]
    fn only_unknown_columns_yield_empty_filter() {
        let filter = Filter::for_model::<Ticket>(Conditions::new().with("unknown", 1_i64));
        assert!(filter.is_empty());
    }
}

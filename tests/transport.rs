#[cfg(test)]
mod tests {
    use kiln::{
        BatchResult, DatabaseConfig, EntityDsl, ExecutionOptions, GenericDialect, IntoQuery,
        QueryError, Result, RowLabeled, SqlDsl, Statement, Transport, UpdateOptions,
        UpdateResult,
    };
    use kiln_tests::{Address, AddressMeta, IdentityStrategy, IdentityStrategyMeta};
    use std::collections::VecDeque;

    /// Records the statements and answers with canned results.
    #[derive(Default)]
    struct Recorder {
        statements: Vec<Statement>,
        counts: VecDeque<u64>,
        batch_counts: Vec<u64>,
        generated_keys: VecDeque<Vec<i64>>,
        batches: usize,
    }

    impl Transport for Recorder {
        fn execute_query(
            &mut self,
            statement: &Statement,
            _options: &ExecutionOptions,
            _handler: &mut dyn FnMut(RowLabeled) -> Result<()>,
        ) -> Result<()> {
            self.statements.push(statement.clone());
            Ok(())
        }

        fn execute_update(
            &mut self,
            statement: &Statement,
            _options: &ExecutionOptions,
            _return_generated_keys: bool,
        ) -> Result<UpdateResult> {
            self.statements.push(statement.clone());
            Ok(UpdateResult {
                count: self.counts.pop_front().unwrap_or(1),
                generated_keys: self.generated_keys.pop_front().unwrap_or_default(),
            })
        }

        fn execute_batch(
            &mut self,
            statements: &[Statement],
            _options: &ExecutionOptions,
            _return_generated_keys: bool,
        ) -> Result<BatchResult> {
            self.statements.extend_from_slice(statements);
            self.batches += 1;
            Ok(BatchResult {
                counts: self.batch_counts.clone(),
                generated_keys: self.generated_keys.pop_front().unwrap_or_default(),
            })
        }

        fn execute(&mut self, statement: &Statement, _options: &ExecutionOptions) -> Result<()> {
            self.statements.push(statement.clone());
            Ok(())
        }
    }

    fn config() -> DatabaseConfig {
        DatabaseConfig::new(GenericDialect)
    }

    #[test]
    fn update_increments_the_version() {
        let a = AddressMeta::new();
        let mut transport = Recorder::default();
        let address = Address::new(1, "STREET 1", 3);
        let updated = EntityDsl::update(&a)
            .single(&address)
            .run(&mut transport, &config())
            .expect("Failed to update");
        assert_eq!(updated, Address::new(1, "STREET 1", 4));
        assert_eq!(address.version, 3);
        assert_eq!(transport.statements.len(), 1);
    }

    #[test]
    fn no_affected_row_is_an_optimistic_lock_failure() {
        let a = AddressMeta::new();
        let mut transport = Recorder {
            counts: [0].into(),
            ..Default::default()
        };
        let error = EntityDsl::update(&a)
            .single(&Address::new(1, "STREET 1", 3))
            .run(&mut transport, &config())
            .expect_err("The update must fail");
        assert_eq!(
            QueryError::find(&error),
            Some(&QueryError::OptimisticLock {
                entity: "ADDRESS".into(),
                index: 0,
                count: 0,
            })
        );

        transport.counts = [0].into();
        let updated = EntityDsl::update(&a)
            .options(|v| UpdateOptions {
                suppress_optimistic_lock_exception: true,
                ..v
            })
            .single(&Address::new(1, "STREET 1", 3))
            .run(&mut transport, &config())
            .expect("A suppressed conflict is not an error");
        assert_eq!(updated.version, 4);
    }

    #[test]
    fn a_missing_batch_count_names_its_index() {
        let a = AddressMeta::new();
        let mut transport = Recorder {
            batch_counts: vec![1],
            ..Default::default()
        };
        let error = EntityDsl::update(&a)
            .batch(&[Address::new(1, "STREET 1", 1), Address::new(2, "STREET 2", 1)])
            .run(&mut transport, &config())
            .expect_err("The second count is missing");
        assert_eq!(
            QueryError::find(&error),
            Some(&QueryError::Build("count not found, index=1".into()))
        );
        assert_eq!(transport.statements.len(), 2);
    }

    #[test]
    fn generated_keys_are_assigned_in_order() {
        let m = IdentityStrategyMeta::new();
        let mut transport = Recorder {
            generated_keys: [vec![41], vec![42, 43, 44]].into(),
            ..Default::default()
        };
        let single = EntityDsl::insert(&m)
            .single(&IdentityStrategy::new("single"))
            .run(&mut transport, &config())
            .expect("Failed to insert");
        assert_eq!(single.id, 41);
        assert!(!transport.statements[0].sql.contains("\"ID\""));

        transport.counts = [3].into();
        let multiple = EntityDsl::insert(&m)
            .multiple(&["a", "b", "c"].map(IdentityStrategy::new))
            .run(&mut transport, &config())
            .expect("Failed to insert multiple rows");
        assert_eq!(multiple.iter().map(|v| v.id).collect::<Vec<_>>(), [42, 43, 44]);
    }

    #[test]
    fn upsert_reports_the_counts() {
        let a = AddressMeta::new();
        let mut transport = Recorder {
            counts: [0].into(),
            batch_counts: vec![1, 0],
            ..Default::default()
        };
        let query = EntityDsl::insert(&a).on_duplicate_key_ignore(Vec::new());
        let ignored = query
            .single(&Address::new(1, "STREET 1", 1))
            .run(&mut transport, &config())
            .expect("Failed to upsert");
        assert_eq!(ignored, 0);
        let counts = query
            .batch(&[Address::new(1, "STREET 1", 1), Address::new(2, "STREET 2", 1)])
            .run(&mut transport, &config())
            .expect("Failed to upsert a batch");
        assert_eq!(counts, [1, 0]);
    }

    #[test]
    fn empty_where_never_reaches_the_transport() {
        let a = AddressMeta::new();
        let mut transport = Recorder::default();
        let error = SqlDsl::delete(&a)
            .run(&mut transport, &config())
            .expect_err("An unbounded delete must be refused");
        assert!(QueryError::is_build(&error));
        let error = SqlDsl::update(&a)
            .set(|s| {
                s.set(&a.street, "SAME");
            })
            .run(&mut transport, &config())
            .expect_err("An unbounded update must be refused");
        assert!(QueryError::is_build(&error));
        assert!(transport.statements.is_empty());
    }

    #[test]
    fn configured_batch_size_splits_batches() {
        let a = AddressMeta::new();
        let mut transport = Recorder {
            batch_counts: vec![1, 1],
            ..Default::default()
        };
        let config = config().with_execution_options(ExecutionOptions {
            batch_size: Some(2),
            ..Default::default()
        });
        let updated = EntityDsl::update(&a)
            .batch(&[
                Address::new(1, "STREET 1", 1),
                Address::new(2, "STREET 2", 1),
                Address::new(3, "STREET 3", 1),
            ])
            .run(&mut transport, &config)
            .expect("Failed to update a batch");
        assert_eq!(updated.iter().map(|v| v.version).collect::<Vec<_>>(), [2, 2, 2]);
        assert_eq!(transport.statements.len(), 3);
        assert_eq!(transport.batches, 2);
    }
}

//! Built-in schema for Cassandra 4.x table options.

use once_cell::sync::Lazy;

use super::Schema;

/// CASSANDRA_TABLE_SCHEMA_YAML declares the table options accepted by
/// `ALTER TABLE ... WITH` together with the defaults Cassandra applies when
/// an option is never set.
pub const CASSANDRA_TABLE_SCHEMA_YAML: &str = r#"properties:
- name: additional_write_policy
  type:
    scalar: string
  default: 99p
- name: bloom_filter_fp_chance
  type:
    scalar: float
  default: 0.01
- name: caching
  type:
    map:
      fields:
      - name: keys
        type:
          scalar: string
        default: ALL
      - name: rows_per_partition
        type:
          scalar: string
        default: NONE
- name: cdc
  type:
    scalar: boolean
  default: false
- name: comment
  type:
    scalar: string
  default: ""
- name: compaction
  resettable: false
  type:
    map:
      fields:
      - name: class
        type:
          scalar: string
          shortClassName: true
        default: SizeTieredCompactionStrategy
      - name: max_threshold
        type:
          scalar: string
        default: "32"
      - name: min_threshold
        type:
          scalar: string
        default: "4"
      elementType:
        scalar: string
- name: compression
  resettable: false
  type:
    map:
      fields:
      - name: chunk_length_in_kb
        type:
          scalar: string
        default: "16"
      - name: class
        type:
          scalar: string
          shortClassName: true
        default: LZ4Compressor
      elementType:
        scalar: string
- name: crc_check_chance
  type:
    scalar: float
  default: 1.0
- name: default_time_to_live
  type:
    scalar: integer
  default: 0
- name: extensions
  type:
    map:
      elementType:
        scalar: blob
- name: gc_grace_seconds
  type:
    scalar: integer
  default: 864000
- name: max_index_interval
  type:
    scalar: integer
  default: 2048
- name: memtable
  type:
    scalar: string
- name: memtable_flush_period_in_ms
  type:
    scalar: integer
  default: 0
- name: min_index_interval
  type:
    scalar: integer
  default: 128
- name: read_repair
  type:
    scalar: string
  default: BLOCKING
- name: speculative_retry
  type:
    scalar: string
  default: 99p
"#;

static CASSANDRA_TABLE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::from_yaml(CASSANDRA_TABLE_SCHEMA_YAML).expect("built-in table schema should parse")
});

/// Returns the built-in Cassandra table schema.
pub fn cassandra_table_schema() -> &'static Schema {
    &CASSANDRA_TABLE_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeShape;

    #[test]
    fn test_builtin_schema_parses() {
        let schema = cassandra_table_schema();
        assert!(schema.find_property("gc_grace_seconds").is_some());
        assert!(schema.find_property("caching").is_some());
        assert!(schema.find_property("keyspace_name").is_none());
    }

    #[test]
    fn test_builtin_schema_is_sorted() {
        let names: Vec<_> = cassandra_table_schema().property_names().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_extensions_hold_blobs() {
        let extensions = cassandra_table_schema().find_property("extensions").unwrap();
        match extensions.property_type.shape() {
            Some(TypeShape::Map(map)) => assert_eq!(
                map.element_type.as_ref().and_then(|t| t.scalar),
                Some(crate::schema::ScalarKind::Blob)
            ),
            other => panic!("unexpected extensions shape: {:?}", other),
        }
    }

    #[test]
    fn test_compaction_accepts_strategy_options() {
        let compaction = cassandra_table_schema().find_property("compaction").unwrap();
        assert!(!compaction.resettable);
        match compaction.property_type.shape() {
            Some(TypeShape::Map(map)) => assert!(map.element_type.is_some()),
            other => panic!("unexpected compaction shape: {:?}", other),
        }
    }
}

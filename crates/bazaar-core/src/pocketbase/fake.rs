//! In-memory record backend for tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{file_url, ApiError, ApiResult, Filter, FilterValue, Join, ListOptions, Op, RecordApi, Term};

pub const BASE_URL: &str = "http://pb.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    List,
    GetOne,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub collection: String,
    pub filter: Option<String>,
    pub body: Option<Value>,
}

struct Failure {
    method: Method,
    collection: String,
    /// Only fail when the request body has this field value
    when: Option<(String, String)>,
    status: u16,
}

/// Collections of JSON records with scripted failures and a call log
#[derive(Default)]
pub struct FakeRecordApi {
    records: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<Failure>>,
    next_id: AtomicUsize,
}

impl FakeRecordApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as-is (it must carry an `id`)
    pub fn seed(&self, collection: &str, record: Value) {
        self.records
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, collection: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.collection == collection)
            .collect()
    }

    /// Fail every `method` call on `collection` with `status`
    pub fn fail(&self, method: Method, collection: &str, status: u16) {
        self.failures.lock().unwrap().push(Failure {
            method,
            collection: collection.to_string(),
            when: None,
            status,
        });
    }

    /// Fail `method` calls on `collection` whose body has `field == value`
    pub fn fail_when(&self, method: Method, collection: &str, field: &str, value: &str, status: u16) {
        self.failures.lock().unwrap().push(Failure {
            method,
            collection: collection.to_string(),
            when: Some((field.to_string(), value.to_string())),
            status,
        });
    }

    fn record_call(
        &self,
        method: Method,
        collection: &str,
        filter: Option<String>,
        body: Option<&Value>,
    ) -> ApiResult<()> {
        self.calls.lock().unwrap().push(Call {
            method,
            collection: collection.to_string(),
            filter,
            body: body.cloned(),
        });

        let failures = self.failures.lock().unwrap();
        let failure = failures.iter().find(|failure| {
            failure.method == method
                && failure.collection == collection
                && failure.when.as_ref().is_none_or(|(field, value)| {
                    body.and_then(|body| body.get(field))
                        .and_then(Value::as_str)
                        .is_some_and(|actual| actual == value.as_str())
                })
        });
        match failure {
            Some(failure) => Err(ApiError::Response {
                status: failure.status,
                message: "Scripted failure.".to_string(),
                fields: Vec::new(),
            }),
            None => Ok(()),
        }
    }

    fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
        serde_json::from_value(value).map_err(|error| ApiError::InvalidPayload(error.to_string()))
    }

    fn not_found() -> ApiError {
        ApiError::Response {
            status: 404,
            message: "The requested resource wasn't found.".to_string(),
            fields: Vec::new(),
        }
    }
}

impl RecordApi for FakeRecordApi {
    async fn get_full_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> ApiResult<Vec<T>> {
        self.record_call(Method::List, collection, options.filter_text(), None)?;

        let mut matching: Vec<Value> = self
            .records(collection)
            .into_iter()
            .filter(|record| options.filter.as_ref().is_none_or(|filter| matches_filter(record, filter)))
            .collect();
        if let Some(sort) = &options.sort {
            matching.sort_by(|a, b| compare_by_sort(a, b, sort));
        }
        matching.into_iter().map(Self::decode::<T>).collect()
    }

    async fn get_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        _options: &ListOptions,
    ) -> ApiResult<T> {
        self.record_call(Method::GetOne, collection, None, None)?;
        let record = self
            .records(collection)
            .into_iter()
            .find(|record| record["id"] == id)
            .ok_or_else(Self::not_found)?;
        Self::decode(record)
    }

    async fn create<T: DeserializeOwned>(&self, collection: &str, body: &Value) -> ApiResult<T> {
        self.record_call(Method::Create, collection, None, Some(body))?;

        let mut record = body.clone();
        if let Some(object) = record.as_object_mut() {
            let n = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            object
                .entry("id")
                .or_insert_with(|| json!(format!("{collection}{n:03}")));
            object
                .entry("created")
                .or_insert_with(|| json!(format!("2025-03-{:02} 10:00:00.000Z", n % 28 + 1)));
            object.insert("collectionName".to_string(), json!(collection));
        }
        self.seed(collection, record.clone());
        Self::decode(record)
    }

    async fn update<T: DeserializeOwned>(&self, collection: &str, id: &str, body: &Value) -> ApiResult<T> {
        self.record_call(Method::Update, collection, None, Some(body))?;

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|record| record["id"] == id))
            .ok_or_else(Self::not_found)?;
        if let (Some(target), Some(patch)) = (record.as_object_mut(), body.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        Self::decode(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()> {
        self.record_call(Method::Delete, collection, None, None)?;

        let mut records = self.records.lock().unwrap();
        let rows = records.get_mut(collection).ok_or_else(Self::not_found)?;
        let before = rows.len();
        rows.retain(|record| record["id"] != id);
        if rows.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }

    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        file_url(BASE_URL, collection, record_id, filename)
    }
}

fn matches_filter(record: &Value, filter: &Filter) -> bool {
    let mut results = filter.terms().iter().map(|term| match term {
        Term::Compare { field, op, value } => field_values(record, field)
            .iter()
            .any(|actual| compare(actual, *op, value)),
        Term::Group(inner) => matches_filter(record, inner),
    });
    match filter.join() {
        Join::And => results.all(|matched| matched),
        Join::Or => results.any(|matched| matched),
    }
}

/// Plain fields read the record; dotted paths read the expanded relation.
fn field_values(record: &Value, field: &str) -> Vec<Value> {
    let Some((relation, rest)) = field.split_once('.') else {
        return vec![record.get(field).cloned().unwrap_or(Value::Null)];
    };
    match &record["expand"][relation] {
        Value::Array(items) => items.iter().map(|item| item[rest].clone()).collect(),
        Value::Null => Vec::new(),
        item => vec![item[rest].clone()],
    }
}

fn compare(actual: &Value, op: Op, expected: &FilterValue) -> bool {
    match (op, expected) {
        (Op::Eq | Op::AnyEq, _) => equals(actual, expected),
        (Op::Neq, _) => !equals(actual, expected),
        (Op::Like, FilterValue::Text(needle)) => actual
            .as_str()
            .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        (Op::Gt | Op::Gte | Op::Lt | Op::Lte, FilterValue::Number(bound)) => {
            actual.as_f64().is_some_and(|number| match op {
                Op::Gt => number > *bound,
                Op::Gte => number >= *bound,
                Op::Lt => number < *bound,
                _ => number <= *bound,
            })
        }
        _ => false,
    }
}

fn equals(actual: &Value, expected: &FilterValue) -> bool {
    match expected {
        FilterValue::Text(text) => actual.as_str() == Some(text.as_str()),
        FilterValue::Number(number) => actual.as_f64() == Some(*number),
        FilterValue::Bool(flag) => actual.as_bool() == Some(*flag),
    }
}

fn compare_by_sort(a: &Value, b: &Value, sort: &str) -> Ordering {
    for key in sort.split(',').map(str::trim).filter(|key| !key.is_empty()) {
        let (field, descending) = key
            .strip_prefix('-')
            .map_or((key, false), |field| (field, true));
        let ordering = compare_values(&a[field], &b[field]);
        let ordering = if descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

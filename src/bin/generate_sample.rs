use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const HEADERS: [&str; 6] = ["城市", "出现次数", "主要相关人物", "关键事件 / 语境", "纬度", "经度"];

/// (city, count, figures, context, lat, lng)
type Row = (&'static str, i64, &'static str, &'static str, Option<f64>, Option<f64>);

const ROWS: &[Row] = &[
    ("南京", 58, "杜少卿、庄绍光、迟衡山、虞博士", "泰伯祠大祭\n秦淮河畔雅集", Some(32.0603), Some(118.7969)),
    ("杭州", 24, "马二先生、匡超人、景兰江", "马二先生游西湖", Some(30.2741), Some(120.1551)),
    ("扬州", 17, "万雪斋、牛玉圃", "盐商宴客", Some(32.3942), Some(119.4129)),
    ("北京", 14, "周进、范进", "会试、中举后进京", Some(39.9042), Some(116.4074)),
    ("天长", 9, "杜少卿、娄焕文", "杜府散财", Some(32.6896), Some(119.0037)),
    ("湖州", 8, "娄三公子、娄四公子、杨执中", "莺脰湖大会", Some(30.8930), Some(120.0868)),
    ("五河", 7, "余大先生、余二先生", "五河县风俗", Some(33.1276), Some(117.8811)),
    ("苏州", 6, "蘧公孙", "游历途经", Some(31.2990), Some(120.5853)),
    ("芜湖", 6, "牛浦郎、牛布衣", "甘露庵", Some(31.3525), Some(118.4331)),
    ("嘉兴", 5, "蘧太守、蘧公孙", "蘧太守致仕", Some(30.7469), Some(120.7555)),
    ("广州", 5, "范进", "范进中举前后", Some(23.1291), Some(113.2644)),
    ("安庆", 4, "向知府", "安庆府审案", Some(30.5430), Some(117.0636)),
    ("南昌", 4, "王惠", "王惠任南昌知府", Some(28.6820), Some(115.8579)),
    ("成都", 3, "郭孝子", "寻父入川", Some(30.5728), Some(104.0668)),
    ("温州", 2, "萧云仙", "途经", Some(27.9938), Some(120.6994)),
    ("范家集", 2, "范进", "乡里（位置不详）", None, None),
];

fn main() -> Result<()> {
    write_csv("sample_places.csv")?;
    let batch = build_batch()?;
    write_parquet("sample_places.parquet", &batch)?;

    arrow::util::pretty::print_batches(&[batch]).context("Failed to print sample table")?;
    println!("Wrote {} places to sample_places.csv and sample_places.parquet", ROWS.len());
    Ok(())
}

fn write_csv(path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {path}"))?;
    writer.write_record(HEADERS)?;
    for (city, count, figures, context, lat, lng) in ROWS {
        writer.write_record([
            city.to_string(),
            count.to_string(),
            figures.to_string(),
            context.to_string(),
            lat.map(|v| v.to_string()).unwrap_or_default(),
            lng.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush().with_context(|| format!("Failed to write {path}"))?;
    Ok(())
}

fn build_batch() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Int64, false),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Utf8, false),
        Field::new(HEADERS[4], DataType::Float64, true),
        Field::new(HEADERS[5], DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(ROWS.iter().map(|r| r.0))),
        Arc::new(Int64Array::from_iter_values(ROWS.iter().map(|r| r.1))),
        Arc::new(StringArray::from_iter_values(ROWS.iter().map(|r| r.2))),
        Arc::new(StringArray::from_iter_values(ROWS.iter().map(|r| r.3))),
        Arc::new(ROWS.iter().map(|r| r.4).collect::<Float64Array>()),
        Arc::new(ROWS.iter().map(|r| r.5).collect::<Float64Array>()),
    ];

    RecordBatch::try_new(schema, columns).context("Failed to create RecordBatch")
}

fn write_parquet(path: &str, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

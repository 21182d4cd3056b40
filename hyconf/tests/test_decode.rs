use hyconf::{
    from_str, from_str_with_options, from_value_with_options, DecodeOptions, Delimiter, ErrorKind, LoadOptions,
    Syntax,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
struct Database {
    host: String,
    port: u16,
    timeout: f64,
    pooled: bool,
    replicas: Vec<String>,
    #[serde(rename = "max-conn")]
    max_conn: i32,
}

#[test]
fn test_decode_struct_from_section() {
    let doc = from_str(
        "[db]\nhost = localhost\nport = 5432\ntimeout = 2.5\npooled = yes\nreplicas = a, b ,c\nmax-conn = 20\n",
    )
    .unwrap();

    let mut db = Database::default();
    doc.decode("db", None, &mut db).unwrap();

    assert_eq!(
        db,
        Database {
            host: "localhost".to_string(),
            port: 5432,
            timeout: 2.5,
            pooled: true,
            replicas: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            max_conn: 20,
        }
    );
}

#[test]
fn test_missing_fields_are_zero_filled() {
    let doc = from_str("[db]\nhost = h\n").unwrap();
    let db: Database = doc.decode_as("db", None).unwrap();
    assert_eq!(db.host, "h");
    assert_eq!(db.port, 0);
    assert!(!db.pooled);
    assert!(db.replicas.is_empty());
}

#[test]
fn test_uncoercible_values_become_zero() {
    let doc = from_str("[db]\nport = eighty\npooled = maybe\ntimeout = soon\n").unwrap();
    let db: Database = doc.decode_as("db", None).unwrap();
    assert_eq!(db.port, 0);
    assert!(!db.pooled);
    assert_eq!(db.timeout, 0.0);
}

#[test]
fn test_absent_key_leaves_target_untouched() {
    let doc = from_str("a = 1\n").unwrap();
    let mut db = Database {
        host: "keep".to_string(),
        ..Default::default()
    };
    doc.decode("db", None, &mut db).unwrap();
    assert_eq!(db.host, "keep");
}

#[test]
fn test_list_values_decode_positionally() {
    let doc = from_str("ports = [80, 443, x]\nmatrix = [[1, 2], [3]]\n").unwrap();
    let ports: Vec<u16> = doc.decode_as("ports", None).unwrap();
    assert_eq!(ports, vec![80, 443, 0]);

    let matrix: Vec<Vec<i64>> = doc.decode_as("matrix", None).unwrap();
    assert_eq!(matrix, vec![vec![1, 2], vec![3]]);
}

#[test]
fn test_empty_scalar_is_empty_sequence() {
    let doc = from_str("tags =\n").unwrap();
    let tags: Vec<String> = doc.decode_as("tags", None).unwrap();
    assert!(tags.is_empty());
}

#[test]
fn test_field_delimiter_override() {
    #[derive(Debug, Deserialize, Serialize)]
    struct Cluster {
        hosts: Vec<String>,
        ports: Vec<u16>,
    }

    let doc = from_str("[cluster]\nhosts = a|b|c\nports = 1,2\n").unwrap();
    let options = DecodeOptions::new().with_field_delimiter("hosts", Delimiter::Pipe);
    let mut cluster = Cluster {
        hosts: vec![],
        ports: vec![],
    };
    doc.decode_with_options("cluster", None, &mut cluster, &options)
        .unwrap();

    assert_eq!(cluster.hosts, vec!["a", "b", "c"]);
    assert_eq!(cluster.ports, vec![1, 2]);
}

#[test]
fn test_nested_structs_maps_and_options() {
    #[derive(Debug, Deserialize)]
    struct App {
        name: String,
        server: Server,
        labels: HashMap<String, String>,
        limits: HashMap<String, u32>,
        proxy: Option<String>,
        missing: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Server {
        port: u16,
        tls: Tls,
    }

    #[derive(Debug, Deserialize)]
    struct Tls {
        enabled: bool,
        cert: String,
    }

    let doc = from_str(
        "name = web\nproxy = p\nserver.port = 443\nserver.tls.enabled = on\n\
         labels = {team = core, tier = 1}\nlimits = {cpu = 2, mem = lots}\n",
    )
    .unwrap();

    let app: App = doc.decode_root().unwrap();
    assert_eq!(app.name, "web");
    assert_eq!(app.server.port, 443);
    assert!(app.server.tls.enabled);
    assert_eq!(app.server.tls.cert, "");
    assert_eq!(app.labels["tier"], "1");
    assert_eq!(app.limits["cpu"], 2);
    assert_eq!(app.limits["mem"], 0);
    assert_eq!(app.proxy.as_deref(), Some("p"));
    assert_eq!(app.missing, None);
}

#[test]
fn test_root_decode_sees_sections_and_type_name() {
    #[derive(Debug, Deserialize)]
    struct Server {
        host: String,
        port: u16,
    }

    let doc = from_str("[server]\nhost = h\nport = 81\n").unwrap();
    let server: Server = doc.decode_root().unwrap();
    assert_eq!(server.host, "h");
    assert_eq!(server.port, 81);
}

#[test]
fn test_array_of_tables_into_vec_of_structs() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        name: String,
        sku: u64,
    }

    let doc = from_str("[[products]]\nname = Hammer\nsku = 738594937\n\n[[products]]\nname = Nail\nsku = 284758393\n")
        .unwrap();
    let products: Vec<Product> = doc.decode_as("products", None).unwrap();
    assert_eq!(
        products,
        vec![
            Product {
                name: "Hammer".to_string(),
                sku: 738594937
            },
            Product {
                name: "Nail".to_string(),
                sku: 284758393
            },
        ]
    );
}

#[test]
fn test_unit_enums_from_scalars() {
    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        Debug,
        Info,
    }

    #[derive(Debug, Deserialize)]
    struct Logging {
        level: Level,
        fallback: Option<Level>,
    }

    let doc = from_str("[logging]\nlevel = info\n").unwrap();
    let logging: Logging = doc.decode_as("logging", None).unwrap();
    assert_eq!(logging.level, Level::Info);
    assert_eq!(logging.fallback, None);

    let doc = from_str("[logging]\n").unwrap();
    let err = doc.decode_as::<Logging>("logging", None).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingKey);
}

#[test]
fn test_root_shape_mismatch() {
    #[derive(Debug, Deserialize)]
    struct Server {
        #[allow(dead_code)]
        port: u16,
    }

    let doc = from_str("ports = [1, 2]\n").unwrap();
    let err = doc.decode_as::<Server>("ports", None).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidTargetShape);
}

#[test]
fn test_nested_shape_mismatch_degrades_to_zero() {
    #[derive(Debug, Deserialize)]
    struct Holder {
        inner: Vec<String>,
        count: u32,
    }

    let doc = from_str("[h]\ninner = {a = 1}\ncount = [1]\n").unwrap();
    let holder: Holder = doc.decode_as("h", None).unwrap();
    assert!(holder.inner.is_empty());
    assert_eq!(holder.count, 0);
}

#[test]
fn test_zero_missing_disabled_uses_serde_defaults() {
    #[derive(Debug, Deserialize)]
    struct Pool {
        #[serde(default = "default_size")]
        size: u32,
        name: Option<String>,
    }

    fn default_size() -> u32 {
        10
    }

    let doc = from_str("[pool]\n").unwrap();
    let options = DecodeOptions::new().with_zero_missing(false);
    let pool: Pool = from_value_with_options(doc.get("pool", None).unwrap(), &options).unwrap();
    assert_eq!(pool.size, 10);
    assert_eq!(pool.name, None);
}

#[test]
fn test_decode_keeps_fields_missing_from_section() {
    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Server {
        host: String,
        port: u16,
        tags: Vec<String>,
    }

    let doc = from_str("[server]\nhost = web\n").unwrap();
    let mut server = Server {
        host: "old".to_string(),
        port: 8080,
        tags: vec!["a".to_string()],
    };
    doc.decode("server", None, &mut server).unwrap();

    assert_eq!(
        server,
        Server {
            host: "web".to_string(),
            port: 8080,
            tags: vec!["a".to_string()],
        }
    );
}

#[test]
fn test_decode_merges_nested_records() {
    #[derive(Debug, Default, Deserialize, Serialize)]
    struct App {
        name: String,
        tls: Tls,
        proxy: Option<String>,
    }

    #[derive(Debug, Default, Deserialize, Serialize)]
    struct Tls {
        enabled: bool,
        cert: String,
    }

    let doc = from_str("[app]\ntls.enabled = true\n").unwrap();
    let mut app = App {
        name: "web".to_string(),
        tls: Tls {
            enabled: false,
            cert: "a.pem".to_string(),
        },
        proxy: Some("p".to_string()),
    };
    doc.decode("app", None, &mut app).unwrap();

    assert_eq!(app.name, "web");
    assert!(app.tls.enabled);
    assert_eq!(app.tls.cert, "a.pem");
    assert_eq!(app.proxy.as_deref(), Some("p"));
}

#[test]
fn test_allocate_nested_optional_records() {
    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Inner {
        port: u16,
        host: String,
        retry: Option<Box<Inner>>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Mode {
        Fast,
        Safe,
    }

    #[derive(Debug, Deserialize)]
    struct Outer {
        name: String,
        inner: Option<Inner>,
        mode: Option<Mode>,
    }

    let doc = from_str("[o]\nname = n\n").unwrap();
    let section = doc.get("o", None).unwrap();

    let plain: Outer = from_value_with_options(section.clone(), &DecodeOptions::new()).unwrap();
    assert_eq!(plain.inner, None);
    assert_eq!(plain.mode, None);

    let options = DecodeOptions::new().with_allocate_nested(true);
    let outer: Outer = from_value_with_options(section, &options).unwrap();
    assert_eq!(outer.name, "n");
    assert_eq!(outer.inner, Some(Inner::default()));
    assert_eq!(outer.mode, Some(Mode::Fast));

    let doc = from_str("[o]\nmode = safe\ninner.port = 9\n").unwrap();
    let outer: Outer = from_value_with_options(doc.get("o", None).unwrap(), &options).unwrap();
    assert_eq!(outer.mode, Some(Mode::Safe));
    assert_eq!(outer.inner.map(|inner| inner.port), Some(9));
}

#[test]
fn test_decode_yaml_document() {
    #[derive(Debug, Deserialize)]
    struct Service {
        name: String,
        ports: Vec<u16>,
        env: HashMap<String, String>,
    }

    let yaml = "service:\n  name: api\n  ports:\n    - 80\n    - 8080\n  env:\n    MODE: prod\n";
    let doc = from_str_with_options(yaml, &LoadOptions::new().with_syntax(Syntax::Yaml)).unwrap();
    let service: Service = doc.decode_as("service", None).unwrap();

    assert_eq!(service.name, "api");
    assert_eq!(service.ports, vec![80, 8080]);
    assert_eq!(service.env["MODE"], "prod");
}

#[test]
fn test_default_delimiter_override() {
    let doc = from_str("words = alpha  beta gamma\n").unwrap();
    let delimiter = Delimiter::from_char(' ').unwrap();
    let options = DecodeOptions::new().with_delimiter(delimiter);

    let mut words: Vec<String> = Vec::new();
    doc.decode_with_options("words", None, &mut words, &options)
        .unwrap();
    assert_eq!(words, vec!["alpha", "beta", "gamma"]);
}

/*!
 * Tests for key extraction and file discovery
 */

use lexicat::scanner::KeyScanner;

use crate::common;

#[test]
fn test_extractKeys_withArgumentsAndWhitespace_shouldTakeFirstLiteral() {
    let content = r#"
        __( 'Spaced' )
        trans_choice("Items", $count)
        @lang('With :name', ['name' => $user])
        trans_choice('No comma')
    "#;

    let keys: Vec<String> = KeyScanner::extract_keys(content).into_iter().collect();

    assert_eq!(keys, common::strings(&["Items", "Spaced", "With :name"]));
}

#[test]
fn test_extractKeys_shouldIgnoreSimilarIdentifiers() {
    let content = "retrans('A'); mytrans('B'); trans('C'); ___('D')";

    let keys: Vec<String> = KeyScanner::extract_keys(content).into_iter().collect();

    assert_eq!(keys, common::strings(&["C", "D"]));
}

#[test]
fn test_discover_acrossRoots_shouldDeduplicate() {
    let dir = common::create_temp_dir();
    common::create_test_file(dir.path(), "app/a.php", "__('Hello')").unwrap();
    common::create_test_file(dir.path(), "resources/views/b.blade.php", "@lang('Hello')").unwrap();
    common::create_test_file(dir.path(), "resources/js/c.txt", "__('Ignored')").unwrap();

    let scanner = KeyScanner::new(&common::strings(&["php"]), &[]);
    let discovery = scanner.discover(
        &[dir.path().join("app"), dir.path().join("resources")],
        false,
    );

    assert_eq!(discovery.files_scanned, 2);
    assert_eq!(discovery.keys.into_iter().collect::<Vec<_>>(), common::strings(&["Hello"]));
}

#[test]
fn test_collectFiles_withNestedExcludedName_shouldPruneAtAnyDepth() {
    let dir = common::create_temp_dir();
    common::create_test_file(dir.path(), "src/node_modules/x.js", "__('X')").unwrap();
    common::create_test_file(dir.path(), "src/deep/node_modules/y.js", "__('Y')").unwrap();
    common::create_test_file(dir.path(), "src/z.js", "__('Z')").unwrap();

    let scanner = KeyScanner::new(&common::strings(&["js"]), &common::strings(&["node_modules"]));
    let files = scanner.collect_files(&[dir.path().join("src")]);

    assert_eq!(files, vec![dir.path().join("src/z.js")]);
}

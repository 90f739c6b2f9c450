// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// Sources arrive as `content://` URIs from the Storage Access Framework and
// are read through the `ContentResolver`. Sharing goes through an
// `ACTION_SEND` chooser; in-memory bytes are first written to the cache dir
// and exposed via the app's `FileProvider` (`<applicationId>.fileprovider`).

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::JNIEnv;
use jni::objects::{JObject, JString, JValue};

use pdftools_core::error::{PdfToolsError, Result};

use crate::traits::*;

/// `Intent.FLAG_GRANT_READ_URI_PERMISSION`.
const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;

/// Process-wide `JavaVM`, resolved on first use.
static JAVA_VM: OnceLock<jni::JavaVM> = OnceLock::new();

/// Obtain a [`JNIEnv`] handle from the global Android context.
///
/// Resolves the `JavaVM*` set by `android_main` or `ANativeActivity_onCreate`
/// through `ndk_context`, then attaches the current thread permanently (codec
/// calls run on the blocking pool, whose threads are reused).
fn jni_env() -> Result<JNIEnv<'static>> {
    let vm = match JAVA_VM.get() {
        Some(vm) => vm,
        None => {
            let ctx = ndk_context::android_context();
            // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
            // The pointer is valid for the lifetime of the process.
            let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
                .map_err(|e| PdfToolsError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
            JAVA_VM.get_or_init(|| vm)
        }
    };
    vm.attach_current_thread_permanently()
        .map_err(|e| PdfToolsError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the hosting Android `Activity` as a [`JObject`].
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(PdfToolsError::Bridge(
            "Android context is null: native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Map any `jni::errors::Error` into `PdfToolsError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> PdfToolsError {
    PdfToolsError::Bridge(format!("{context}: {e}"))
}

/// Android implementation of the platform bridge.
///
/// Zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge. No JNI call happens until a trait method
    /// is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeFileAccess: ContentResolver.openInputStream
// ---------------------------------------------------------------------------

impl NativeFileAccess for AndroidBridge {
    fn read_source(&self, uri: &str) -> Result<Vec<u8>> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::debug!(uri, "Android: reading source URI");

        let uri_obj = parse_uri(&mut env, uri)?;

        let resolver: JObject = env
            .call_method(
                &activity,
                "getContentResolver",
                "()Landroid/content/ContentResolver;",
                &[],
            )
            .map_err(|e| jni_err("getContentResolver", e))?
            .l()
            .map_err(|e| jni_err("getContentResolver->l", e))?;

        let input_stream: JObject = match env.call_method(
            &resolver,
            "openInputStream",
            "(Landroid/net/Uri;)Ljava/io/InputStream;",
            &[JValue::Object(&uri_obj)],
        ) {
            Ok(value) => value.l().map_err(|e| jni_err("openInputStream->l", e))?,
            Err(jni::errors::Error::JavaException) => {
                // SecurityException when the URI grant has expired or was never given.
                let _ = env.exception_clear();
                return Err(PdfToolsError::MissingPermissions);
            }
            Err(e) => return Err(jni_err("openInputStream", e)),
        };

        if input_stream.is_null() {
            return Err(PdfToolsError::Bridge(format!(
                "ContentResolver returned null InputStream for URI: {uri}"
            )));
        }

        let baos: JObject = env
            .new_object("java/io/ByteArrayOutputStream", "()V", &[])
            .map_err(|e| jni_err("new ByteArrayOutputStream", e))?;

        let buffer = env
            .new_byte_array(8192)
            .map_err(|e| jni_err("new_byte_array(8192)", e))?;

        loop {
            let bytes_read: i32 = env
                .call_method(&input_stream, "read", "([B)I", &[JValue::Object(&buffer)])
                .map_err(|e| jni_err("InputStream.read", e))?
                .i()
                .map_err(|e| jni_err("InputStream.read->i", e))?;

            if bytes_read < 0 {
                break;
            }

            env.call_method(
                &baos,
                "write",
                "([BII)V",
                &[
                    JValue::Object(&buffer),
                    JValue::Int(0),
                    JValue::Int(bytes_read),
                ],
            )
            .map_err(|e| jni_err("ByteArrayOutputStream.write", e))?;
        }

        env.call_method(&input_stream, "close", "()V", &[])
            .map_err(|e| jni_err("InputStream.close", e))?;

        let java_bytes: JObject = env
            .call_method(&baos, "toByteArray", "()[B", &[])
            .map_err(|e| jni_err("toByteArray", e))?
            .l()
            .map_err(|e| jni_err("toByteArray->l", e))?;

        let result = env
            .convert_byte_array(jni::objects::JByteArray::from(java_bytes))
            .map_err(|e| jni_err("convert_byte_array", e))?;

        tracing::debug!(uri, bytes = result.len(), "Android: source read");
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// NativeShare: Intent.ACTION_SEND chooser
// ---------------------------------------------------------------------------

impl NativeShare for AndroidBridge {
    fn share_bytes(&self, bytes: &[u8], filename: &str, mime_type: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(filename, bytes = bytes.len(), "Android: sharing bytes");

        // new File(getCacheDir(), filename)
        let cache_dir: JObject = env
            .call_method(&activity, "getCacheDir", "()Ljava/io/File;", &[])
            .map_err(|e| jni_err("getCacheDir", e))?
            .l()
            .map_err(|e| jni_err("getCacheDir->l", e))?;

        let j_filename = java_string(&mut env, filename)?;

        let file_obj: JObject = env
            .new_object(
                "java/io/File",
                "(Ljava/io/File;Ljava/lang/String;)V",
                &[JValue::Object(&cache_dir), JValue::Object(&j_filename)],
            )
            .map_err(|e| jni_err("new File", e))?;

        let fos: JObject = env
            .new_object(
                "java/io/FileOutputStream",
                "(Ljava/io/File;)V",
                &[JValue::Object(&file_obj)],
            )
            .map_err(|e| jni_err("new FileOutputStream", e))?;

        let byte_array = env
            .byte_array_from_slice(bytes)
            .map_err(|e| jni_err("byte_array_from_slice", e))?;

        env.call_method(&fos, "write", "([B)V", &[JValue::Object(&byte_array)])
            .map_err(|e| jni_err("FileOutputStream.write", e))?;

        env.call_method(&fos, "close", "()V", &[])
            .map_err(|e| jni_err("FileOutputStream.close", e))?;

        let authority = get_authority(&mut env, &activity)?;
        let j_authority = java_string(&mut env, &authority)?;

        let content_uri: JObject = env
            .call_static_method(
                "androidx/core/content/FileProvider",
                "getUriForFile",
                "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
                &[
                    JValue::Object(&activity),
                    JValue::Object(&j_authority),
                    JValue::Object(&file_obj),
                ],
            )
            .map_err(|e| jni_err("FileProvider.getUriForFile", e))?
            .l()
            .map_err(|e| jni_err("getUriForFile->l", e))?;

        launch_send_chooser(&mut env, &activity, &content_uri, mime_type)?;

        tracing::info!(filename, "Android: share intent dispatched");
        Ok(())
    }

    fn share_uri(&self, uri: &str, mime_type: Option<&str>) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(uri, "Android: sharing URI");

        let uri_obj = parse_uri(&mut env, uri)?;
        launch_send_chooser(&mut env, &activity, &uri_obj, mime_type.unwrap_or("*/*"))?;

        tracing::info!(uri, "Android: share intent dispatched");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `Uri.parse(uri)`.
fn parse_uri<'a>(env: &mut JNIEnv<'a>, uri: &str) -> Result<JObject<'a>> {
    let j_uri_str = java_string(env, uri)?;

    env.call_static_method(
        "android/net/Uri",
        "parse",
        "(Ljava/lang/String;)Landroid/net/Uri;",
        &[JValue::Object(&j_uri_str)],
    )
    .map_err(|e| jni_err("Uri.parse", e))?
    .l()
    .map_err(|e| jni_err("Uri.parse->l", e))
}

fn java_string<'a>(env: &mut JNIEnv<'a>, value: &str) -> Result<JString<'a>> {
    env.new_string(value).map_err(|e| jni_err("new_string", e))
}

/// `new Intent(ACTION_SEND).setType(mime_type)`.
fn send_intent<'a>(env: &mut JNIEnv<'a>, mime_type: &str) -> Result<JObject<'a>> {
    let j_action = java_string(env, "android.intent.action.SEND")?;
    let intent: JObject = env
        .new_object(
            "android/content/Intent",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&j_action)],
        )
        .map_err(|e| jni_err("new Intent(SEND)", e))?;

    let j_mime = java_string(env, mime_type)?;
    env.call_method(
        &intent,
        "setType",
        "(Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(&j_mime)],
    )
    .map_err(|e| jni_err("Intent.setType", e))?;
    Ok(intent)
}

/// `intent.putExtra(key, value)` for the overload named by `signature`.
fn put_extra(
    env: &mut JNIEnv<'_>,
    intent: &JObject<'_>,
    key: &str,
    signature: &str,
    value: &JObject<'_>,
) -> Result<()> {
    let j_key = java_string(env, key)?;
    env.call_method(
        intent,
        "putExtra",
        signature,
        &[JValue::Object(&j_key), JValue::Object(value)],
    )
    .map_err(|e| jni_err(&format!("putExtra({key})"), e))?;
    Ok(())
}

/// Share `content_uri` as `EXTRA_STREAM` with a read grant for the receiver.
fn launch_send_chooser(
    env: &mut JNIEnv<'_>,
    activity: &JObject<'_>,
    content_uri: &JObject<'_>,
    mime_type: &str,
) -> Result<()> {
    let intent = send_intent(env, mime_type)?;
    put_extra(
        env,
        &intent,
        "android.intent.extra.STREAM",
        "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
        content_uri,
    )?;
    env.call_method(
        &intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(FLAG_GRANT_READ_URI_PERMISSION)],
    )
    .map_err(|e| jni_err("Intent.addFlags", e))?;

    start_chooser(env, activity, &intent)
}

/// Wrap `intent` in a chooser and start it from `activity`.
fn start_chooser(env: &mut JNIEnv<'_>, activity: &JObject<'_>, intent: &JObject<'_>) -> Result<()> {
    let j_title = java_string(env, "Share via")?;

    let chooser: JObject = env
        .call_static_method(
            "android/content/Intent",
            "createChooser",
            "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
            &[JValue::Object(intent), JValue::Object(&j_title)],
        )
        .map_err(|e| jni_err("Intent.createChooser", e))?
        .l()
        .map_err(|e| jni_err("createChooser->l", e))?;

    env.call_method(
        activity,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[JValue::Object(&chooser)],
    )
    .map_err(|e| jni_err("startActivity(share)", e))?;

    Ok(())
}

/// FileProvider authority: `<applicationId>.fileprovider`.
fn get_authority(env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> Result<String> {
    let j_pkg: JObject = env
        .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("getPackageName", e))?
        .l()
        .map_err(|e| jni_err("getPackageName->l", e))?;

    let pkg: String = env
        .get_string(&JString::from(j_pkg))
        .map_err(|e| jni_err("get_string(packageName)", e))?
        .into();

    Ok(format!("{pkg}.fileprovider"))
}

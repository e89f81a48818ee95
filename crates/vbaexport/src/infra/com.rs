//! Late-bound COM plumbing: apartment lifetime and `IDispatch` calls.

use std::marker::PhantomData;

use windows::Win32::System::Com::{
    CLSCTX_LOCAL_SERVER, CLSIDFromProgID, COINIT_APARTMENTTHREADED, CoCreateInstance,
    CoInitializeEx, CoUninitialize, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
    DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO, IDispatch,
};
use windows::core::{BSTR, GUID, HSTRING, IUnknown, Interface, PCWSTR, VARIANT};

use crate::domain::errors::AutomationError;

const LOCALE_USER_DEFAULT: u32 = 0x0400;
const DISPID_PROPERTYPUT: i32 = -3;

/// COM initialized as a single-threaded apartment on the current thread.
///
/// Not `Send`/`Sync`: it must be dropped (and `CoUninitialize` called) on the
/// thread that created it, and every interface obtained while it is alive
/// belongs to that thread as well.
#[derive(Debug)]
pub struct Apartment {
    _thread_bound: PhantomData<*const ()>,
}

impl Apartment {
    pub fn initialize() -> Result<Self, AutomationError> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|err| call_error("CoInitializeEx", &err, None))?;
        tracing::debug!("COM apartment initialized");
        Ok(Self {
            _thread_bound: PhantomData,
        })
    }

    /// Start an out-of-process server registered under `prog_id`.
    pub fn create_instance(&self, prog_id: &str) -> Result<IUnknown, AutomationError> {
        let wide = HSTRING::from(prog_id);
        let clsid = unsafe { CLSIDFromProgID(PCWSTR(wide.as_ptr())) }
            .map_err(|err| call_error("CLSIDFromProgID", &err, None))?;
        unsafe { CoCreateInstance(&clsid, None::<&IUnknown>, CLSCTX_LOCAL_SERVER) }
            .map_err(|err| call_error("CoCreateInstance", &err, None))
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
        tracing::debug!("COM apartment uninitialized");
    }
}

/// Owned reference to an automation object, released on drop.
#[derive(Debug)]
pub struct Dispatch {
    inner: IDispatch,
}

impl Dispatch {
    pub fn from_unknown(unknown: &IUnknown) -> Result<Self, AutomationError> {
        let inner = unknown
            .cast::<IDispatch>()
            .map_err(|err| call_error("QueryInterface(IDispatch)", &err, None))?;
        Ok(Self { inner })
    }

    pub fn get(&self, member: &str, args: &[VARIANT]) -> Result<VARIANT, AutomationError> {
        self.invoke(member, DISPATCH_PROPERTYGET, args)
    }

    pub fn put(&self, member: &str, value: VARIANT) -> Result<(), AutomationError> {
        self.invoke(member, DISPATCH_PROPERTYPUT, &[value]).map(drop)
    }

    pub fn call(&self, member: &str, args: &[VARIANT]) -> Result<VARIANT, AutomationError> {
        self.invoke(member, DISPATCH_METHOD, args)
    }

    pub fn get_object(&self, member: &str, args: &[VARIANT]) -> Result<Dispatch, AutomationError> {
        into_dispatch(member, self.get(member, args)?)
    }

    pub fn call_object(&self, member: &str, args: &[VARIANT]) -> Result<Dispatch, AutomationError> {
        into_dispatch(member, self.call(member, args)?)
    }

    pub fn get_i32(&self, member: &str) -> Result<i32, AutomationError> {
        let value = self.get(member, &[])?;
        i32::try_from(&value).map_err(|err| conversion_error(member, &err))
    }

    pub fn get_string(&self, member: &str, args: &[VARIANT]) -> Result<String, AutomationError> {
        let value = self.get(member, args)?;
        BSTR::try_from(&value)
            .map(|text| text.to_string())
            .map_err(|err| conversion_error(member, &err))
    }

    fn dispid(&self, member: &str) -> Result<i32, AutomationError> {
        let wide = HSTRING::from(member);
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0;
        unsafe {
            self.inner.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )
        }
        .map_err(|err| call_error(member, &err, None))?;
        Ok(dispid)
    }

    fn invoke(
        &self,
        member: &str,
        flags: DISPATCH_FLAGS,
        args: &[VARIANT],
    ) -> Result<VARIANT, AutomationError> {
        let dispid = self.dispid(member)?;
        tracing::trace!(member, dispid, argc = args.len(), "IDispatch::Invoke");

        // Positional arguments travel in reverse order.
        let mut args: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let mut named = DISPID_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: if is_put {
                &mut named
            } else {
                std::ptr::null_mut()
            },
            cArgs: args.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = VARIANT::default();
        let mut excep = EXCEPINFO::default();
        unsafe {
            self.inner.Invoke(
                dispid,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result as *mut VARIANT),
                Some(&mut excep as *mut EXCEPINFO),
                None,
            )
        }
        .map_err(|err| call_error(member, &err, Some(&excep)))?;
        Ok(result)
    }
}

fn into_dispatch(member: &str, value: VARIANT) -> Result<Dispatch, AutomationError> {
    if value.is_empty() {
        return Err(AutomationError::null(member));
    }
    let unknown = IUnknown::try_from(&value).map_err(|_| AutomationError::null(member))?;
    Dispatch::from_unknown(&unknown)
}

fn call_error(
    member: &str,
    err: &windows::core::Error,
    excep: Option<&EXCEPINFO>,
) -> AutomationError {
    let description = excep
        .map(|info| info.bstrDescription.to_string())
        .filter(|text| !text.trim().is_empty());
    AutomationError::Call {
        member: member.to_owned(),
        code: err.code().0 as u32,
        message: description.unwrap_or_else(|| err.message().trim().to_owned()),
    }
}

fn conversion_error(member: &str, err: &windows::core::Error) -> AutomationError {
    AutomationError::Conversion {
        member: member.to_owned(),
        message: err.message().trim().to_owned(),
    }
}
